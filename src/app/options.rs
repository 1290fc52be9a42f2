use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::pipeline::DEFAULT_WORKERS;
use crate::storage::MEMORY_DESTINATION;

/// Environment variable overriding the default worker count
pub const WORKERS_ENV: &str = "SDFCHECK_WORKERS";

/// Placeholder replaced by the archive file name in store paths
pub const ARCHIVE_PLACEHOLDER: &str = "{archive}";

/// sdfcheck - parallel regression and invariance tests over SD archives
#[derive(Parser, Debug)]
#[command(name = "sdfcheck")]
#[command(version)]
#[command(about = "Parallel regression and invariance tests over compressed SD archives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Let the built-in self-check judge every record
    Invariance(CommonArgs),
    /// Compare every record with a reference, or capture one
    Regression(RegressionArgs),
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Gzipped SD archives, processed one after another
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    /// Result store: `:memory:` or a CSV path; `{archive}` is replaced by
    /// the archive file name
    #[arg(long, default_value = MEMORY_DESTINATION)]
    pub result_destination: String,

    /// Number of parallel workers
    #[arg(long, env = WORKERS_ENV, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("reference_source")
        .required(true)
        .multiple(false)
        .args(["regression_reference", "compute_reference"])
))]
pub struct RegressionArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Reference store the run is compared against
    #[arg(long)]
    pub regression_reference: Option<String>,

    /// Capture the reference into the result destination
    #[arg(long)]
    pub compute_reference: bool,
}

/// Test protocol selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Invariance,
    /// Compare against the reference store at the given path
    Regression { reference: String },
    /// Capture the reference into the result destination
    ComputeReference,
}

/// Resolved command line of the `sdfcheck` binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    pub archives: Vec<PathBuf>,
    pub result_destination: String,
    pub workers: usize,
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        let (mode, common) = match cli.command {
            Command::Invariance(common) => (Mode::Invariance, common),
            Command::Regression(args) => {
                let mode = match args.regression_reference {
                    Some(reference) => Mode::Regression { reference },
                    None => Mode::ComputeReference,
                };
                (mode, args.common)
            }
        };

        Self {
            mode,
            archives: common.archives,
            result_destination: common.result_destination,
            workers: common.workers,
        }
    }
}

impl RunOptions {
    /// Result destination for one archive
    pub fn destination_for(&self, archive: &Path) -> String {
        expand(&self.result_destination, archive)
    }

    /// Reference path for one archive, if comparing against a reference
    pub fn reference_for(&self, archive: &Path) -> Option<PathBuf> {
        match &self.mode {
            Mode::Regression { reference } => Some(PathBuf::from(expand(reference, archive))),
            _ => None,
        }
    }
}

fn expand(template: &str, archive: &Path) -> String {
    let name = archive
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    template.replace(ARCHIVE_PLACEHOLDER, &name)
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(workers) if workers > 0 => Ok(workers),
        _ => Err(format!("invalid worker count '{raw}', expected a positive integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<RunOptions, clap::Error> {
        let argv = std::iter::once("sdfcheck").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(RunOptions::from)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn invariance_defaults_to_memory_destination() {
        let options = parse(&["invariance", "Compound_1.sdf.gz", "--workers", "8"]).unwrap();

        assert_eq!(options.mode, Mode::Invariance);
        assert_eq!(options.archives, vec![PathBuf::from("Compound_1.sdf.gz")]);
        assert_eq!(options.result_destination, ":memory:");
        assert_eq!(options.workers, 8);
    }

    #[test]
    fn regression_against_reference() {
        let options = parse(&[
            "regression",
            "a.sdf.gz",
            "--regression-reference",
            "ref.csv",
            "--result-destination",
            "log.csv",
            "--workers",
            "3",
        ])
        .unwrap();

        assert_eq!(
            options.mode,
            Mode::Regression {
                reference: "ref.csv".to_string()
            }
        );
        assert_eq!(options.result_destination, "log.csv");
        assert_eq!(options.workers, 3);
        assert_eq!(
            options.reference_for(Path::new("a.sdf.gz")),
            Some(PathBuf::from("ref.csv"))
        );
    }

    #[test]
    fn compute_reference_mode() {
        let options = parse(&["regression", "a.sdf.gz", "b.sdf.gz", "--compute-reference"]).unwrap();

        assert_eq!(options.mode, Mode::ComputeReference);
        assert_eq!(options.archives.len(), 2);
        assert_eq!(options.reference_for(Path::new("a.sdf.gz")), None);
    }

    #[test]
    fn regression_requires_exactly_one_reference_source() {
        let missing = parse(&["regression", "a.sdf.gz"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);

        let both = parse(&[
            "regression",
            "a.sdf.gz",
            "--compute-reference",
            "--regression-reference",
            "r.csv",
        ])
        .unwrap_err();
        assert_eq!(both.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["bench", "a.sdf.gz"]).is_err());
        assert!(parse(&["invariance"]).is_err());
        assert!(parse(&["invariance", "a.sdf.gz", "--workers", "0"]).is_err());
        assert!(parse(&["invariance", "a.sdf.gz", "--workers"]).is_err());
        assert!(parse(&["invariance", "a.sdf.gz", "--compute-reference"]).is_err());
    }

    #[test]
    fn workers_fall_back_to_environment() {
        let command = Cli::command();
        let invariance = command.find_subcommand("invariance").unwrap();
        let workers = invariance
            .get_arguments()
            .find(|arg| arg.get_id() == "workers")
            .unwrap();

        assert_eq!(workers.get_env(), Some(std::ffi::OsStr::new(WORKERS_ENV)));
    }

    #[test]
    fn worker_count_must_be_positive() {
        assert_eq!(parse_workers("12"), Ok(12));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn archive_placeholder_is_expanded() {
        let options = parse(&[
            "regression",
            "data/Compound_1.sdf.gz",
            "--regression-reference",
            "refs/{archive}.csv",
            "--result-destination",
            "logs/{archive}.csv",
        ])
        .unwrap();
        let archive = Path::new("data/Compound_1.sdf.gz");

        assert_eq!(
            options.reference_for(archive),
            Some(PathBuf::from("refs/Compound_1.sdf.gz.csv"))
        );
        assert_eq!(options.destination_for(archive), "logs/Compound_1.sdf.gz.csv");
    }
}
