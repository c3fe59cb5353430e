use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clarity::ClarityError;
use std::path::PathBuf;

mod commands;

/// Run unit tests compiled into dynamic libraries.
///
/// Every library must export `clarity_register_tests`, which registers its
/// suites. Libraries listed in clarity.toml are loaded before the ones given
/// on the command line.
///
/// EXAMPLES:
///     clarity run target/debug/libmath_tests.so    Run one test library
///     clarity run math_tests -L target/debug       Resolve a bare library name
///     clarity list                                 List suites from clarity.toml
///
/// ENVIRONMENT VARIABLES:
///     CLARITY_FORMAT        'text' or 'json'
///     CLARITY_LIBRARY_PATH  Extra library search paths
///     NO_COLOR              Set to disable colored output
///     RUST_LOG              Log filter (default: warn)
#[derive(Parser)]
#[command(name = "clarity")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load test libraries and run every registered suite
    ///
    /// Exits with 0 when every suite passed, 1 when any test or fixture
    /// failed, and with the loader status code when a library cannot be
    /// loaded.
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        load: LoadArgs,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Emit one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// Load test libraries and list their suites without running them
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        load: LoadArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Library selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// Test libraries: paths or bare names resolved through the search paths
    pub libraries: Vec<String>,
    /// Use this clarity.toml instead of searching for one
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Add a library search directory (repeatable)
    #[arg(long = "search-path", short = 'L')]
    pub search_paths: Vec<PathBuf>,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let cli = Cli::parse();
    if let Err(err) = dispatch(cli) {
        eprintln!("error: {:#}", err);
        let code = err
            .downcast_ref::<ClarityError>()
            .map(ClarityError::status_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            load,
            no_color,
            json,
        } => {
            let args = commands::run::RunArgs {
                load,
                no_color,
                json,
            };
            let passed = commands::run::run(args)?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::List { load, json } => {
            commands::list::run(load, json)?;
        }
    }
    Ok(())
}
