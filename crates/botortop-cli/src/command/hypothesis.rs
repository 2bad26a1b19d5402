use anyhow::Context as _;
use botortop_analysis::{features::TradeRow, hypothesis};
use botortop_model::training::DEFAULT_SEED;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use super::ExportArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TestArg {
    /// Number of permutations per test
    #[arg(long, default_value_t = hypothesis::DEFAULT_PERMUTATIONS)]
    pub(crate) permutations: usize,
    /// Seed of the permutation generator
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &TestArg) -> anyhow::Result<()> {
    let rows = arg.export.read_processed_rows()?;
    export(&rows, arg.permutations, arg.seed, &arg.export)
}

pub(crate) fn export(
    rows: &[TradeRow],
    permutations: usize,
    seed: u64,
    export: &ExportArg,
) -> anyhow::Result<()> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let tests = hypothesis::run_all(rows, permutations, &mut rng)
        .context("Failed to run bot-vs-top permutation tests")?;
    export.save_json("hypothesis_tests.json", &tests)
}
