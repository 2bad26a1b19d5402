use std::path::PathBuf;

use botortop_analysis::{hypothesis, missingness};
use botortop_model::{fairness, training::DEFAULT_SEED};

use super::{ExportArg, eda, model, process};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AllArg {
    /// Match telemetry CSV, one row per player per game
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Seed shared by every randomized stage
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &AllArg) -> anyhow::Result<()> {
    arg.export.create_dir()?;
    let table = process::load_table(&arg.data)?;

    tracing::info!("stage 1/5: processing trade games");
    let rows = process::process(&table, &arg.export)?;
    tracing::info!("stage 2/5: exploratory summaries");
    eda::export(&rows, &arg.export)?;
    tracing::info!("stage 3/5: hypothesis tests");
    super::hypothesis::export(
        &rows,
        hypothesis::DEFAULT_PERMUTATIONS,
        arg.seed,
        &arg.export,
    )?;
    tracing::info!("stage 4/5: missingness analysis");
    super::missingness::export(
        &table,
        missingness::DEFAULT_PERMUTATIONS,
        arg.seed,
        &arg.export,
    )?;
    tracing::info!("stage 5/5: models");
    model::export(
        &rows,
        arg.seed,
        fairness::DEFAULT_PERMUTATIONS,
        &arg.export,
    )?;
    Ok(())
}
