//! Printers - render test results and suite reports
//!
//! [`ConsolePrinter`] draws the human-readable report: bordered banners for
//! suite names and summaries, one line per test, and the message and
//! location of every failure. [`JsonPrinter`] emits one JSON object per event
//! for tooling.

use crate::suite::SuiteReport;
use crate::test::TestResult;
use colored::*;
use std::io::{self, Write};

const TEST_SEPARATOR: char = '=';
const SUITE_BORDER: char = '*';
const INDENT: &str = "\t";
const REPORT_FIELD_WIDTH: usize = 5;

/// Receives progress from a running suite
pub trait Printer {
    /// Called once per test, right after it ran
    fn print_test_result(&mut self, result: &TestResult);

    /// Called before the first test of a suite
    fn print_suite_name(&mut self, name: &str);

    /// Called once the whole suite, including its teardown, succeeded
    fn print_suite_report(&mut self, report: &SuiteReport);
}

/// Layout and color settings for [`ConsolePrinter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Width of the `=` line printed before a failed test
    pub test_separator_width: usize,
    /// Width of the suite name banner
    pub suite_banner_width: usize,
    /// Width of the suite report banner
    pub report_banner_width: usize,
    /// Color PASS/FAIL/SKIPPED
    pub color: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            test_separator_width: 80,
            suite_banner_width: 100,
            report_banner_width: 120,
            color: true,
        }
    }
}

impl PrinterConfig {
    /// Default widths without color
    pub fn plain() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }

    /// Enable or disable color
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Write `text` centered in a box bordered with `border`.
///
/// Text longer than the inner width wraps onto extra rows. When the padding
/// cannot be split evenly the extra space goes on the right.
fn write_box(out: &mut dyn Write, text: &str, border: char, width: usize, top: bool) -> io::Result<()> {
    let inner = width.saturating_sub(2).max(1);
    let line: String = std::iter::repeat(border).take(width).collect();

    if top {
        writeln!(out, "{}", line)?;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut rows: Vec<String> = chars
        .chunks(inner)
        .map(|chunk| chunk.iter().collect())
        .collect();
    if rows.is_empty() {
        rows.push(String::new());
    }

    for row in rows {
        let spaces = inner - row.chars().count();
        let left = spaces / 2;
        let right = spaces - left;
        writeln!(
            out,
            "{}{}{}{}{}",
            border,
            " ".repeat(left),
            row,
            " ".repeat(right),
            border
        )?;
    }

    writeln!(out, "{}", line)
}

/// Summary line shown inside the report banner
pub fn report_summary(report: &SuiteReport) -> String {
    format!(
        "Total: {:<w$} Succeeded: {:<w$} Failed: {:<w$} Skipped: {:<w$}",
        report.total,
        report.succeeded,
        report.failed,
        report.skipped,
        w = REPORT_FIELD_WIDTH
    )
}

/// Human-readable console printer
pub struct ConsolePrinter<W: Write> {
    out: W,
    config: PrinterConfig,
}

impl ConsolePrinter<io::Stdout> {
    /// Printer writing to stdout with default settings
    pub fn stdout() -> Self {
        Self::new(io::stdout(), PrinterConfig::default())
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W, config: PrinterConfig) -> Self {
        Self { out, config }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Consume the printer and return its writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn status(&self, result: &TestResult) -> String {
        let (label, color) = if result.is_skipped() {
            ("SKIPPED", Color::Yellow)
        } else if result.passed {
            ("PASS", Color::Green)
        } else {
            ("FAIL", Color::Red)
        };

        if self.config.color {
            label.color(color).bold().to_string()
        } else {
            label.to_string()
        }
    }

    fn write_result(&mut self, result: &TestResult) -> io::Result<()> {
        if result.is_fail() {
            let separator: String = std::iter::repeat(TEST_SEPARATOR)
                .take(self.config.test_separator_width)
                .collect();
            writeln!(self.out, "{}", separator)?;
        }

        let status = self.status(result);
        writeln!(self.out, "[{}] Result: {}", result.name, status)?;

        if result.is_fail() {
            writeln!(
                self.out,
                "{}{}",
                INDENT,
                result.error_message.as_deref().unwrap_or("")
            )?;
            writeln!(
                self.out,
                "{}File: {}:{}",
                INDENT,
                result.file.as_deref().unwrap_or("<unknown>"),
                result.line
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> Printer for ConsolePrinter<W> {
    fn print_test_result(&mut self, result: &TestResult) {
        let _ = self.write_result(result);
    }

    fn print_suite_name(&mut self, name: &str) {
        let _ = write_box(
            &mut self.out,
            name,
            SUITE_BORDER,
            self.config.suite_banner_width,
            true,
        );
    }

    fn print_suite_report(&mut self, report: &SuiteReport) {
        let width = self.config.report_banner_width;
        let _ = write_box(&mut self.out, &report.name, SUITE_BORDER, width, true)
            .and_then(|_| write_box(&mut self.out, &report_summary(report), SUITE_BORDER, width, false))
            .and_then(|_| self.out.flush());
    }
}

/// Line-delimited JSON printer
pub struct JsonPrinter<W: Write> {
    out: W,
}

impl JsonPrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        let _ = writeln!(self.out, "{}", value);
    }
}

impl<W: Write> Printer for JsonPrinter<W> {
    fn print_test_result(&mut self, result: &TestResult) {
        self.emit(serde_json::json!({
            "event": "test",
            "result": result,
        }));
    }

    fn print_suite_name(&mut self, name: &str) {
        self.emit(serde_json::json!({
            "event": "suite",
            "name": name,
        }));
    }

    fn print_suite_report(&mut self, report: &SuiteReport) {
        self.emit(serde_json::json!({
            "event": "report",
            "report": report,
        }));
    }
}
