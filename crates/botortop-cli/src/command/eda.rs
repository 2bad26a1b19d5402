use botortop_analysis::{eda::EdaReport, features::TradeRow};

use super::ExportArg;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EdaArg {
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &EdaArg) -> anyhow::Result<()> {
    let rows = arg.export.read_processed_rows()?;
    export(&rows, &arg.export)
}

pub(crate) fn export(rows: &[TradeRow], export: &ExportArg) -> anyhow::Result<()> {
    let report = EdaReport::new(rows);
    export.save_json("head_data.json", &report.head)?;
    export.save_json("lii_distribution.json", &report.lii_distribution)?;
    export.save_json("pivot_table.json", &report.pivot)?;
    export.save_json(
        "obj_conversion_by_focus.json",
        &report.obj_conversion_by_focus,
    )?;
    export.save_json("winrate_by_focus.json", &report.winrate_by_focus)?;
    export.save_json("lii_binned.json", &report.lii_binned)?;
    Ok(())
}
