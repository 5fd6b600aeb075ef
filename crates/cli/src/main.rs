// kbatch - batch geometry keylog calculations from spreadsheets

mod batch;
mod catalog;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use keybatch_client::{ClientError, GeometryClient};
use keybatch_config::{ConfigError, Settings};
use keybatch_engine::{EngineError, Group, Operation, ShapeSelection, TransportError};

use exit_codes::{
    EXIT_CONFIG, EXIT_DETECTION_FAILED, EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_REMOTE_HTTP,
    EXIT_REMOTE_UNREACHABLE, EXIT_SUCCESS, EXIT_USAGE, EXIT_VALIDATION_FAILED,
};

#[derive(Parser)]
#[command(name = "kbatch")]
#[command(about = "Batch geometry keylog calculations for spreadsheet rows")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/keybatch/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log more (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the columns of an input file and the shapes detected from them
    #[command(after_help = "\
Examples:
  kbatch inspect points.csv
  kbatch inspect planes.xlsx --json")]
    Inspect {
        /// Input file (.csv, .tsv, .xlsx, .xls, .ods)
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that an input file has every column the selected shapes need
    #[command(after_help = "\
Examples:
  kbatch validate rows.csv -p distance
  kbatch validate rows.xlsx -p area --primary circle
  kbatch validate rows.csv -p intersection --secondary plane --json

Exit codes:
  0   valid
  10  empty dataset or missing columns
  11  a shape could not be detected")]
    Validate {
        /// Input file (.csv, .tsv, .xlsx, .xls, .ods)
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output the validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send every row to the geometry service and write the keylogs back
    #[command(after_help = "\
Examples:
  kbatch run rows.csv -p distance
  kbatch run rows.xlsx -p area --primary sphere -o areas.xlsx
  kbatch run rows.csv -p intersection --chunk-size 500 --strict
  kbatch run rows.csv -p volume --api-base http://10.0.0.5:5000/api/geometry --json

Rows of a chunk that fails after every retry get an empty keylog; the
rest of the batch still runs. Use --strict to exit 12 in that case.")]
    Run {
        /// Input file (.csv, .tsv, .xlsx, .xls, .ods)
        input: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output file; format from extension (.xlsx, .csv, .tsv, .json)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Rows per service call (clamped to 10..=1000)
        #[arg(long, value_name = "N")]
        chunk_size: Option<usize>,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Calculator version sent with every calculation
        #[arg(long, value_name = "VERSION")]
        calculator_version: Option<String>,

        /// Column the keylog is written to
        #[arg(long, value_name = "NAME")]
        output_column: Option<String>,

        /// Exit 12 if any row failed or was skipped
        #[arg(long)]
        strict: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// No progress output
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// List operations and shapes known to the service
    #[command(after_help = "\
Examples:
  kbatch operations
  kbatch operations --shapes
  kbatch operations --for distance
  kbatch operations --builtin --json")]
    Operations {
        /// List shapes instead of operations
        #[arg(long, conflicts_with = "for_operation")]
        shapes: bool,

        /// List the shapes one operation accepts
        #[arg(long = "for", value_name = "OPERATION")]
        for_operation: Option<Operation>,

        /// Use the built-in lists instead of asking the service
        #[arg(long)]
        builtin: bool,

        #[command(flatten)]
        remote: RemoteArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Operation and shape choice shared by `validate` and `run`.
#[derive(Args)]
pub struct SelectionArgs {
    /// Operation (intersection, distance, area, volume, line-equation,
    /// or a service label)
    #[arg(long, short = 'p')]
    pub operation: Operation,

    /// Primary shape: auto, point, line, plane, circle, sphere
    #[arg(long, default_value = "auto", value_name = "SHAPE")]
    pub primary: ShapeSelection,

    /// Secondary shape (ignored for area and volume)
    #[arg(long, default_value = "auto", value_name = "SHAPE")]
    pub secondary: ShapeSelection,
}

/// Service location overrides; settings and environment apply otherwise.
#[derive(Args)]
pub struct RemoteArgs {
    /// Service root, e.g. http://localhost:5000/api/geometry
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Bearer token
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
}

impl RemoteArgs {
    /// Build a client from settings, with these flags taking precedence.
    pub fn client(&self, settings: &Settings) -> Result<GeometryClient, CliError> {
        let api_base = self.api_base.as_deref().unwrap_or(&settings.api_base);
        let token = self.token.clone().or_else(|| settings.api_token.clone());
        GeometryClient::new(api_base, token, settings.timeout()).map_err(CliError::client)
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  keybatch-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Settings::load(cli.config.as_deref())
        .map_err(CliError::config)
        .and_then(|settings| match cli.command {
            Commands::Inspect { input, json } => batch::cmd_inspect(&settings, input, json),
            Commands::Validate { input, selection, json } => {
                batch::cmd_validate(&settings, input, selection, json)
            }
            Commands::Run {
                input,
                selection,
                output,
                chunk_size,
                remote,
                calculator_version,
                output_column,
                strict,
                json,
                quiet,
            } => batch::cmd_run(
                &settings,
                batch::RunOptions {
                    input,
                    selection,
                    output,
                    chunk_size,
                    remote,
                    calculator_version,
                    output_column,
                    strict,
                    json,
                    quiet,
                },
            ),
            Commands::Operations { shapes, for_operation, builtin, remote, json } => {
                catalog::cmd_operations(&settings, shapes, for_operation, builtin, remote, json)
            }
        });

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

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Io(_) => None,
            _ => Some(format!("settings file: {}", Settings::config_path().display())),
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    /// Map a refused batch to its exit code.
    pub fn engine(err: EngineError) -> Self {
        match err {
            EngineError::EmptyDataset => Self {
                code: EXIT_VALIDATION_FAILED,
                message: "input has no data rows".to_string(),
                hint: None,
            },
            EngineError::Validation(report) => Self {
                code: EXIT_VALIDATION_FAILED,
                message: format!("validation failed:\n  {}", report.errors.join("\n  ")),
                hint: Some("rename the columns or add aliases under [aliases] in settings".into()),
            },
            EngineError::DetectionFailure { group } => {
                let flag = match group {
                    Group::Primary => "--primary",
                    Group::Secondary => "--secondary",
                };
                Self {
                    code: EXIT_DETECTION_FAILED,
                    message: err.to_string(),
                    hint: Some(format!(
                        "pass {flag} <point|line|plane|circle|sphere>, or run `kbatch inspect` on the file"
                    )),
                }
            }
            other => Self { code: EXIT_ERROR, message: other.to_string(), hint: None },
        }
    }

    pub fn client(err: ClientError) -> Self {
        let (code, hint) = match &err {
            ClientError::Network(_) => (
                EXIT_REMOTE_UNREACHABLE,
                Some("is the geometry service running? check api_base or KEYBATCH_API_BASE".to_string()),
            ),
            ClientError::Http(401, _) | ClientError::Http(403, _) => (
                EXIT_REMOTE_HTTP,
                Some("check api_token or KEYBATCH_API_TOKEN".to_string()),
            ),
            ClientError::InvalidUrl(_) => (
                EXIT_CONFIG,
                Some("api_base must be an absolute URL, e.g. http://localhost:5000/api/geometry".to_string()),
            ),
            _ => (EXIT_REMOTE_HTTP, None),
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Failure of the last attempt of a chunk, when nothing in the batch got through.
    pub fn transport(err: &TransportError, api_base: &str) -> Self {
        match err {
            TransportError::Network(_) => Self {
                code: EXIT_REMOTE_UNREACHABLE,
                message: format!("every chunk failed: {}", err),
                hint: Some(format!("is the geometry service running at {}?", api_base)),
            },
            _ => Self {
                code: EXIT_REMOTE_HTTP,
                message: format!("every chunk failed: {}", err),
                hint: None,
            },
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
