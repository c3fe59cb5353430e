//! Process-wide suite registry and entry points
//!
//! Test libraries register their suites here from their registration entry
//! point; the process then runs everything with [`run_tests`] or through a
//! [`Registry`] handle.

use crate::error::{ClarityError, ClarityResult};
use crate::fixture::Fixture;
use crate::host;
use crate::loader::{ModuleLoader, TestLibraries};
use crate::printer::{ConsolePrinter, Printer};
use crate::suite::Suite;
use crate::test::Test;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use std::path::PathBuf;

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::new()));

static LIBRARIES: Lazy<Mutex<TestLibraries>> = Lazy::new(|| Mutex::new(TestLibraries::default()));

/// Suites in registration order
#[derive(Debug, Default)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suite. Names must be unique.
    pub fn add_suite(&mut self, suite: Suite) -> ClarityResult<()> {
        if suite.name().is_empty() {
            return Err(ClarityError::InvalidArgument(
                "suite name cannot be empty".to_string(),
            ));
        }
        if self.suite(suite.name()).is_some() {
            return Err(ClarityError::InvalidArgument(format!(
                "suite '{}' is already registered",
                suite.name()
            )));
        }

        tracing::debug!(suite = %suite.name(), tests = suite.len(), "registering suite");
        self.suites.push(suite);
        Ok(())
    }

    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name() == name)
    }

    pub fn suite_mut(&mut self, name: &str) -> Option<&mut Suite> {
        self.suites.iter_mut().find(|s| s.name() == name)
    }

    /// Append a test to the named suite
    pub fn add_test(&mut self, suite: &str, test: impl Into<Option<Test>>) -> ClarityResult<()> {
        self.suite_mut(suite)
            .ok_or_else(|| ClarityError::SuiteIsNull(suite.to_string()))?
            .add_test(test)
    }

    /// Append a per-test fixture to the named suite
    pub fn add_fixture(
        &mut self,
        suite: &str,
        fixture: impl Into<Option<Fixture>>,
    ) -> ClarityResult<()> {
        self.suite_mut(suite)
            .ok_or_else(|| ClarityError::SuiteIsNull(suite.to_string()))?
            .add_fixture(fixture)
    }

    /// Run one suite. An unknown suite runs nothing and passes.
    pub fn run_suite(&mut self, name: &str, printer: &mut dyn Printer) -> bool {
        match self.suite_mut(name) {
            Some(suite) => suite.run_with(printer),
            None => {
                tracing::debug!(suite = %name, "no such suite, nothing to run");
                true
            }
        }
    }

    /// Run every suite in registration order, even after a failure.
    /// Returns true only if every suite passed.
    pub fn run_all(&mut self, printer: &mut dyn Printer) -> bool {
        let mut all_passed = true;
        for suite in &mut self.suites {
            all_passed &= suite.run_with(printer);
        }
        all_passed
    }

    pub fn suite_names(&self) -> Vec<&str> {
        self.suites.iter().map(Suite::name).collect()
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Drop every registered suite
    pub fn clear(&mut self) {
        self.suites.clear();
    }
}

/// Lock the process-wide registry
pub fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock()
}

/// Add a suite to the process-wide registry.
///
/// Inside a test library bound to a host, the suite goes to the host's
/// registry.
pub fn register_suite(suite: Suite) -> ClarityResult<()> {
    let name = suite.name().to_string();
    match host::forward_suite(suite) {
        Ok(0) => Ok(()),
        Ok(status) => Err(ClarityError::InvalidArgument(format!(
            "host rejected suite '{}' (status {})",
            name, status
        ))),
        Err(suite) => registry().add_suite(suite),
    }
}

#[doc(hidden)]
pub fn registration_failed(error: &ClarityError) {
    if !host::forward_failure(error) {
        tracing::warn!(error = %error, "test library failed to register its suites");
    }
}

/// Run every registered suite against `printer`.
///
/// The suites are taken out of the registry while they run so test bodies
/// may use the registry themselves. Suites registered during the run are
/// kept after the existing ones.
pub fn run_registered(printer: &mut dyn Printer) -> bool {
    let mut running = Registry {
        suites: std::mem::take(&mut registry().suites),
    };

    let passed = running.run_all(printer);

    let mut guard = registry();
    running.suites.append(&mut guard.suites);
    guard.suites = running.suites;
    passed
}

/// Run every registered suite on stdout and exit the process: status 0 if
/// every suite passed (or none was registered), 1 otherwise
pub fn run_tests() -> ! {
    let mut printer = ConsolePrinter::stdout();
    let passed = run_registered(&mut printer);
    std::process::exit(if passed { 0 } else { 1 })
}

/// Load a test library and register its suites.
///
/// Loading a library that is already loaded succeeds without registering
/// it again.
pub fn load_tests(path: &str) -> ClarityResult<()> {
    load_with(&LIBRARIES, path).map(|_| ())
}

/// Load through `libraries`, returning how many suites the library added.
///
/// The lock is released while the library's entry point runs so it can load
/// further libraries itself.
fn load_with<L>(libraries: &Mutex<TestLibraries<L>>, path: &str) -> ClarityResult<usize>
where
    L: ModuleLoader + Default,
{
    let pending = libraries.lock().open(path)?;
    let Some(pending) = pending else {
        return Ok(0);
    };

    let before = registry().len();
    let pending = pending.register()?;
    let added = registry().len().saturating_sub(before);
    if added == 0 {
        tracing::warn!(path = %pending.path().display(), "test library registered no suites");
    }

    libraries.lock().commit(pending);
    Ok(added)
}

/// Close every loaded test library
pub fn unload_tests() -> ClarityResult<()> {
    LIBRARIES.lock().unload_all()
}

/// Prepend a directory to the library search path used by [`load_tests`]
pub fn add_library_search_path(path: impl Into<PathBuf>) {
    LIBRARIES.lock().resolver_mut().add_search_path(path.into());
}

/// Number of test libraries currently loaded
pub fn loaded_library_count() -> usize {
    LIBRARIES.lock().loaded_count()
}
