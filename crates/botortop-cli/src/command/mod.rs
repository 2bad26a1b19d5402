use std::{fs, path::PathBuf};

use anyhow::Context as _;
use botortop_analysis::features::TradeRow;
use clap::{Parser, Subcommand};

use crate::util::{self, Output};

use self::{
    all::AllArg, eda::EdaArg, hypothesis::TestArg, missingness::MissingnessArg, model::ModelArg,
    process::ProcessArg,
};

mod all;
mod eda;
mod hypothesis;
mod missingness;
mod model;
mod process;

pub(crate) const PROCESSED_DATA_FILE: &str = "processed_data.json";

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Which pipeline stage to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Detect cross-map trade games and engineer features
    Process(#[clap(flatten)] ProcessArg),
    /// Export exploratory summary tables
    Eda(#[clap(flatten)] EdaArg),
    /// Run the bot-vs-top permutation tests
    Test(#[clap(flatten)] TestArg),
    /// Test whether the most-missing column is missing at random
    Missingness(#[clap(flatten)] MissingnessArg),
    /// Train the baseline and final win-prediction models
    Model(#[clap(flatten)] ModelArg),
    /// Run every stage in order
    All(#[clap(flatten)] AllArg),
}

/// Where a stage reads `processed_data.json` from and writes its exports to.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    /// Directory holding the JSON exports
    #[arg(long, default_value = "data")]
    pub(crate) output_dir: PathBuf,
    /// Print exports to stdout instead of writing them to the output directory
    #[arg(long)]
    pub(crate) stdout: bool,
}

impl ExportArg {
    pub(crate) fn create_dir(&self) -> anyhow::Result<()> {
        if !self.stdout {
            fs::create_dir_all(&self.output_dir).with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_dir.display()
                )
            })?;
        }
        Ok(())
    }

    pub(crate) fn save_json<T>(&self, file_name: &str, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let path = (!self.stdout).then(|| self.output_dir.join(file_name));
        Output::save_json(value, path)
    }

    pub(crate) fn read_processed_rows(&self) -> anyhow::Result<Vec<TradeRow>> {
        let rows = util::read_processed_file(self.output_dir.join(PROCESSED_DATA_FILE))?;
        tracing::info!(rows = rows.len(), "loaded processed trade rows");
        Ok(rows)
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Process(arg) => process::run(&arg)?,
        Mode::Eda(arg) => eda::run(&arg)?,
        Mode::Test(arg) => hypothesis::run(&arg)?,
        Mode::Missingness(arg) => missingness::run(&arg)?,
        Mode::Model(arg) => model::run(&arg)?,
        Mode::All(arg) => all::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_test_defaults() {
        let args = CommandArgs::try_parse_from(["botortop", "test"]).unwrap();
        let Mode::Test(arg) = args.mode else {
            panic!("expected test mode");
        };
        assert_eq!(
            arg.permutations,
            botortop_analysis::hypothesis::DEFAULT_PERMUTATIONS
        );
        assert_eq!(arg.seed, botortop_model::training::DEFAULT_SEED);
        assert_eq!(arg.export.output_dir, PathBuf::from("data"));
        assert!(!arg.export.stdout);
    }

    #[test]
    fn test_process_requires_data() {
        assert!(CommandArgs::try_parse_from(["botortop", "process"]).is_err());
        let args = CommandArgs::try_parse_from([
            "botortop",
            "process",
            "--data",
            "matches.csv",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert!(matches!(args.mode, Mode::Process(_)));
    }
}
