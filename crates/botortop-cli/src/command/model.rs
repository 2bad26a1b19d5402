use anyhow::Context as _;
use botortop_analysis::features::TradeRow;
use botortop_model::training::{self, DEFAULT_SEED, TrainConfig};

use super::ExportArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ModelArg {
    /// Seed of the split, the folds and the forests
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
    /// Number of permutations of the fairness test
    #[arg(long, default_value_t = botortop_model::fairness::DEFAULT_PERMUTATIONS)]
    pub(crate) fairness_permutations: usize,
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &ModelArg) -> anyhow::Result<()> {
    let rows = arg.export.read_processed_rows()?;
    export(&rows, arg.seed, arg.fairness_permutations, &arg.export)
}

pub(crate) fn export(
    rows: &[TradeRow],
    seed: u64,
    fairness_permutations: usize,
    export: &ExportArg,
) -> anyhow::Result<()> {
    let config = TrainConfig {
        seed,
        fairness_permutations,
        ..TrainConfig::default()
    };
    let results = training::train(rows, &config).context("Failed to train models")?;
    export.save_json("model_results.json", &results)
}
