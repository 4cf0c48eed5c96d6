// drecon - reconcile expected data against actual data, keyed by a unique column

mod args;
mod console;
mod exit_codes;
mod fetch;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use datarecon_io::IoError;
use datarecon_recon::ReconError;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_CANCELLED, EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser, Debug)]
#[command(name = "drecon")]
#[command(about = "Reconcile an expected dataset against actual data, keyed by a unique column")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Error codes in the log:
  1  wrong value              (one cell differs)
  2  duplicated key in actual data
  3  duplicated key in expected data
  4  missing row in actual data
  5  excessive row in actual data

Examples:
  drecon -i expected.csv -o discrepancies.csv
  drecon -i expected.json -o log.txt -e report.xlsx -f -v
  drecon -i expected.csv -o log.csv -c fare,pclass -p 90,727
  drecon -i expected.csv -o log.csv --actual actual.json --json")]
pub struct Cli {
    /// Expected data (.csv or .json)
    #[arg(short = 'i', long = "inputfile", value_name = "PATH")]
    pub input: PathBuf,

    /// Discrepancy log (.csv or .txt), written while the run progresses
    #[arg(short = 'o', long = "outputfile", value_name = "PATH")]
    pub output: PathBuf,

    /// Excel report with marked discrepancies (.xlsx or .xls)
    #[arg(short = 'e', long = "excel", value_name = "PATH")]
    pub excel: Option<PathBuf>,

    /// Comma-separated list of columns to compare
    #[arg(short = 'c', long = "columns", value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Comma-separated list of keys to compare
    #[arg(short = 'p', long = "keys", visible_alias = "passengerid", value_delimiter = ',')]
    pub keys: Option<Vec<String>>,

    /// Unique key column [default: passengerid]
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,

    /// Compare float columns approximately (|a-b| <= atol + rtol*|b|)
    #[arg(short = 'f', long = "floatprecision")]
    pub float_precision: bool,

    /// Print the discrepancy table and progress messages
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Records API serving the actual data
    #[arg(long, env = "DRECON_URL", default_value = fetch::DEFAULT_URL)]
    pub url: String,

    /// Read actual data from a file instead of the records API
    #[arg(long, value_name = "PATH")]
    pub actual: Option<PathBuf>,

    /// TOML config; command-line flags take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the grouped discrepancies and summary as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  datarecon-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run::cmd_reconcile(&cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let code = match &err {
            IoError::Read { .. } | IoError::Write { .. } | IoError::Xlsx(_) => EXIT_IO,
            IoError::Csv(_) | IoError::Json(_) | IoError::Shape(_) => EXIT_PARSE,
        };
        Self { code, message: err.to_string(), hint: None }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let message = err.to_string();
        match err {
            ReconError::MissingColumn { .. } => {
                CliError::args(message).with_hint("check -c/--columns and -k/--key against both datasets")
            }
            ReconError::SchemaMismatch { .. } => Self { code: EXIT_CONFIG, message, hint: None }
                .with_hint("use '-c' to select the columns to compare"),
            ReconError::Validation(_) | ReconError::ConfigParse(_) => {
                Self { code: EXIT_CONFIG, message, hint: None }
            }
            ReconError::Sink(_) => CliError::io(message),
            ReconError::Cancelled { .. } => Self { code: EXIT_CANCELLED, message, hint: None }
                .with_hint("the log holds the discrepancies found before cancellation"),
        }
    }
}
