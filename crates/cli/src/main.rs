// returnscan CLI - scan verification of marketplace return shipments

mod exit_codes;
mod inspect;
mod tui;
mod util;
mod verify;
mod workbook;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{extract_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_LOAD, EXIT_REPORT, EXIT_SUCCESS, EXIT_USAGE};
use returnscan_config::{Settings, SettingsError};
use returnscan_io::{LoadError, ReportError};
use returnscan_recon::ExtractError;

use verify::FilterArgs;

#[derive(Parser)]
#[command(name = "rscan")]
#[command(about = "Verify marketplace return shipments by scanning their tracking numbers")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: <config dir>/returnscan/settings.toml)
    #[arg(long, global = true, env = "RSCAN_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract shipments from a returns export and list them
    #[command(after_help = "\
Examples:
  rscan inspect returns.xlsx
  rscan inspect returns.xlsx --json | jq '.records | length'")]
    Inspect {
        /// Returns export workbook (xlsx, xls, xlsb, ods)
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Verify a batch of scanned tracking numbers against an export
    #[command(after_help = "\
Examples:
  rscan verify returns.xlsx 1234567890 99988877701
  cat scans.txt | rscan verify returns.xlsx --stdin --report-dir out/
  rscan verify returns.xlsx --stdin --courier Delhivery --return-type rto --json")]
    Verify {
        /// Returns export workbook
        file: PathBuf,

        /// Tracking numbers, in scan order
        awbs: Vec<String>,

        /// Also read tracking numbers from stdin, one per line
        #[arg(long)]
        stdin: bool,

        /// Write the report to this path
        #[arg(long, value_name = "PATH", conflicts_with = "report_dir")]
        report: Option<PathBuf>,

        /// Write the report into this directory under a dated file name
        #[arg(long, value_name = "DIR")]
        report_dir: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Interactive scan screen
    #[command(after_help = "\
Keys:
  type / scan     tracking number (looked up after a short pause)
  Ctrl-F          edit filter (e.g. `courier:ekart type:rto reason:damaged`);
                  bare words must each appear in the product details
  Up/Down         move in the pending list
  Ctrl-X          select / unselect row
  Ctrl-D          mark selected rows (or the current row) as received
  Ctrl-E          export report
  Ctrl-O          reload the export file
  Ctrl-C          quit")]
    Scan {
        /// Returns export workbook
        file: PathBuf,

        /// Directory for exported reports
        #[arg(long, value_name = "DIR", default_value = ".")]
        report_dir: PathBuf,
    },

    /// Show effective settings
    Config {
        /// Print only the settings file path
        #[arg(long)]
        path: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  returnscan-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log lines would tear the scan screen; keep it to errors unless asked.
    let default_filter = match cli.command {
        Some(Commands::Scan { .. }) => "error",
        _ => "warn",
    };
    init_logging(default_filter);

    let result = match cli.command {
        None => {
            eprintln!("Usage: rscan <command> [options]");
            eprintln!("       rscan --help for more information");
            Ok(())
        }
        Some(Commands::Config { path }) => cmd_config(cli.config, path),
        Some(Commands::Inspect { file, json }) => {
            load_settings(cli.config.as_ref()).and_then(|settings| inspect::cmd_inspect(&file, json, &settings))
        }
        Some(Commands::Verify { file, awbs, stdin, report, report_dir, filters, json }) => {
            load_settings(cli.config.as_ref()).and_then(|settings| {
                let args = verify::VerifyArgs { file, awbs, stdin, report, report_dir, filters, json };
                verify::cmd_verify(args, &settings)
            })
        }
        Some(Commands::Scan { file, report_dir }) => {
            load_settings(cli.config.as_ref()).and_then(|settings| tui::cmd_scan(file, report_dir, settings))
        }
    };

    match result {
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

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    match path {
        Some(p) => Settings::load_from(p),
        None => Settings::load(),
    }
    .map_err(CliError::settings)
}

fn cmd_config(path: Option<PathBuf>, path_only: bool) -> Result<(), CliError> {
    if path_only {
        match path {
            Some(p) => println!("{}", p.display()),
            None => println!("{}", Settings::config_path_display()),
        }
        return Ok(());
    }
    let settings = load_settings(path.as_ref())?;
    print!("{}", settings.to_toml());
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn settings(err: SettingsError) -> Self {
        let hint = match &err {
            SettingsError::Read { .. } => None,
            _ => Some("run `rscan config --path` to find the settings file".to_string()),
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    pub fn load(err: LoadError) -> Self {
        Self::new(EXIT_LOAD, err.to_string())
    }

    pub fn extract(err: ExtractError) -> Self {
        let hint = match &err {
            ExtractError::HeaderNotFound { .. } => {
                Some("is this the returns export? [sheet].header_marker sets the header text".to_string())
            }
            ExtractError::ColumnMismatch { .. } => {
                Some("check the column layout or [sheet] column indices in settings".to_string())
            }
            ExtractError::NoRecords => None,
        };
        Self { code: extract_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn report(err: ReportError) -> Self {
        Self::new(EXIT_REPORT, err.to_string())
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
