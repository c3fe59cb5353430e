//! Run command - load test libraries and run every registered suite

use crate::LoadArgs;
use anyhow::Result;
use clarity::{ConsolePrinter, JsonPrinter, Printer, PrinterConfig};
use clarity_config::{Config, OutputFormat};
use colored::*;

/// Arguments for the run command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub load: LoadArgs,
    /// Disable colored output (overrides config)
    pub no_color: bool,
    /// JSON output (overrides config)
    pub json: bool,
}

/// Printer settings after applying CLI flags over the loaded config
fn printer_config(config: &Config, args: &RunArgs) -> PrinterConfig {
    let (test_separator_width, suite_banner_width, report_banner_width) = config.widths();
    PrinterConfig {
        test_separator_width,
        suite_banner_width,
        report_banner_width,
        color: config.color() && !args.no_color,
    }
}

/// Run the run command. Returns whether every suite passed.
pub fn run(args: RunArgs) -> Result<bool> {
    let config = super::load_config(&args.load)?;
    let json = args.json || config.format() == OutputFormat::Json;
    let printer_config = printer_config(&config, &args);

    if !printer_config.color {
        colored::control::set_override(false);
    }

    let loaded = super::load_libraries(&config, &args.load)?;
    tracing::debug!(libraries = loaded, "libraries loaded");

    let suite_count = clarity::registry().len();
    if suite_count == 0 && !json {
        println!("{}", "No test suites registered.".yellow());
    }

    let mut printer: Box<dyn Printer> = if json {
        Box::new(JsonPrinter::stdout())
    } else {
        Box::new(ConsolePrinter::new(std::io::stdout(), printer_config))
    };
    let passed = clarity::run_registered(printer.as_mut());

    super::unload_libraries();
    Ok(passed)
}
