//! Shared helpers for the runtime integration tests

#![allow(dead_code)]

use clarity::{Fixture, Printer, SuiteReport, Test, TestResult};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

/// Everything a suite run printed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Printed {
    Suite(String),
    Result(TestResult),
    Report(SuiteReport),
}

/// Printer that remembers every call instead of writing text
#[derive(Debug, Default)]
pub struct RecordingPrinter {
    pub events: Vec<Printed>,
}

impl RecordingPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<&TestResult> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Printed::Result(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn report(&self) -> Option<&SuiteReport> {
        self.events.iter().find_map(|e| match e {
            Printed::Report(r) => Some(r),
            _ => None,
        })
    }

    pub fn printed_suite_name(&self) -> bool {
        matches!(self.events.first(), Some(Printed::Suite(_)))
    }
}

impl Printer for RecordingPrinter {
    fn print_test_result(&mut self, result: &TestResult) {
        self.events.push(Printed::Result(result.clone()));
    }

    fn print_suite_name(&mut self, name: &str) {
        self.events.push(Printed::Suite(name.to_string()));
    }

    fn print_suite_report(&mut self, report: &SuiteReport) {
        self.events.push(Printed::Report(report.clone()));
    }
}

/// Ordered log shared between tests and fixtures
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    /// Test that logs its name and passes
    pub fn test(&self, name: &str) -> Test {
        let log = self.clone();
        let label = name.to_string();
        Test::new(name, move |_, _| log.push(label.clone())).unwrap()
    }

    /// Fixture logging `setup:<label>` / `teardown:<label>` with the given statuses
    pub fn fixture(&self, label: &str, setup_status: i32, teardown_status: i32) -> Fixture {
        let setup_log = self.clone();
        let teardown_log = self.clone();
        let setup_entry = format!("setup:{}", label);
        let teardown_entry = format!("teardown:{}", label);
        Fixture::new()
            .with_setup(
                move |_| {
                    setup_log.push(setup_entry.clone());
                    setup_status
                },
                None,
            )
            .with_teardown(
                move |_| {
                    teardown_log.push(teardown_entry.clone());
                    teardown_status
                },
                None,
            )
    }
}

/// Path of the `clarity-test-library` cdylib, built on first use.
///
/// It builds into its own target directory; the outer `cargo test` keeps
/// the workspace one locked while tests run.
pub fn test_library() -> &'static Path {
    static LIBRARY: Lazy<PathBuf> = Lazy::new(|| {
        let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("test-library");

        let status = Command::new(env!("CARGO"))
            .args(["build", "--quiet", "--package", "clarity-test-library"])
            .arg("--target-dir")
            .arg(&target_dir)
            .current_dir(&workspace)
            .status()
            .expect("failed to run cargo");
        assert!(status.success(), "building clarity-test-library failed");

        let path = target_dir.join("debug").join(format!(
            "{}clarity_test_library{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        ));
        assert!(path.is_file(), "missing {}", path.display());
        path
    });
    &LIBRARY
}
