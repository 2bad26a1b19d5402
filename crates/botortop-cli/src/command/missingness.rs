use std::path::PathBuf;

use anyhow::Context as _;
use botortop_analysis::{dataset::RawTable, missingness};
use botortop_model::training::DEFAULT_SEED;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use super::{ExportArg, process};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MissingnessArg {
    /// Match telemetry CSV, one row per player per game
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Number of permutations per dependency test
    #[arg(long, default_value_t = missingness::DEFAULT_PERMUTATIONS)]
    pub(crate) permutations: usize,
    /// Seed of the permutation generator
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
    #[clap(flatten)]
    pub(crate) export: ExportArg,
}

pub(crate) fn run(arg: &MissingnessArg) -> anyhow::Result<()> {
    arg.export.create_dir()?;
    let table = process::load_table(&arg.data)?;
    export(&table, arg.permutations, arg.seed, &arg.export)
}

pub(crate) fn export(
    table: &RawTable,
    permutations: usize,
    seed: u64,
    export: &ExportArg,
) -> anyhow::Result<()> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let report = missingness::analyze(table, permutations, &mut rng)
        .context("Failed to run missingness analysis")?;
    export.save_json("missingness_results.json", &report)
}
