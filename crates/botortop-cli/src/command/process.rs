use std::path::{Path, PathBuf};

use anyhow::Context as _;
use botortop_analysis::{
    dataset::RawTable,
    features::{self, SummaryStats, TradeRow},
};

use super::{ExportArg, PROCESSED_DATA_FILE};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ProcessArg {
    /// Match telemetry CSV, one row per player per game
    #[arg(long)]
    pub(crate) data: PathBuf,
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &ProcessArg) -> anyhow::Result<()> {
    arg.export.create_dir()?;
    let table = load_table(&arg.data)?;
    process(&table, &arg.export)?;
    Ok(())
}

pub(crate) fn load_table(path: &Path) -> anyhow::Result<RawTable> {
    let table = RawTable::from_path(path)
        .with_context(|| format!("Failed to load match data: {}", path.display()))?;
    tracing::info!(rows = table.len(), path = %path.display(), "loaded match data");
    Ok(table)
}

/// Builds the trade rows and writes `processed_data.json` and `summary_stats.json`.
pub(crate) fn process(table: &RawTable, export: &ExportArg) -> anyhow::Result<Vec<TradeRow>> {
    let players = table
        .player_rows()
        .context("Failed to read player rows from match data")?;
    let rows = features::build_trade_rows(&players);
    if rows.is_empty() {
        tracing::warn!("no cross-map trade games found");
    }

    let summary = SummaryStats::new(&rows);
    tracing::info!(
        trade_games = summary.total_trade_games,
        bot_focus_winrate = summary.bot_focus_winrate,
        top_focus_winrate = summary.top_focus_winrate,
        "processed trade games"
    );

    export.save_json(PROCESSED_DATA_FILE, &rows)?;
    export.save_json("summary_stats.json", &summary)?;
    Ok(rows)
}
