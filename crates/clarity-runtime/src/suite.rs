//! Suites - ordered tests, their fixtures, and the run algorithm
//!
//! Running a suite follows a fixed order:
//!
//! 1. suite setup
//! 2. for every test, in insertion order:
//!    per-test setups (insertion order), the test itself, then per-test
//!    teardowns (reverse insertion order)
//! 3. suite teardown
//! 4. the aggregated report
//!
//! Setup failures abort the run on the spot. Teardowns for a test are always
//! all attempted; a failing one stops the run once the rest and the suite
//! teardown have run.

use crate::error::{ClarityError, ClarityResult};
use crate::fixture::{Fixture, FixtureData, FixtureStatus, Hook};
use crate::printer::{ConsolePrinter, Printer};
use crate::test::{DataMut, Test, TestResult};
use serde::Serialize;

/// Largest number of slots added to suite storage in a single growth step
pub const MAX_GROWTH_STEP: usize = 512;

/// Slots allocated the first time an empty suite grows
const INITIAL_CAPACITY: usize = 4;

/// Aggregated counts for one suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl SuiteReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Count one test result
    pub fn record(&mut self, result: &TestResult) {
        self.total += 1;
        if result.is_skipped() {
            self.skipped += 1;
        } else if result.passed {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// How a suite run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteOutcome {
    /// The suite had no tests; nothing ran and nothing was printed
    Empty,
    /// The suite setup reported a non-zero status; no test ran
    SetupFailed { status: FixtureStatus },
    /// A per-test setup failed before `test` could run
    FixtureSetupFailed {
        test: String,
        status: FixtureStatus,
        report: SuiteReport,
    },
    /// At least one per-test teardown failed after `test` ran. The suite
    /// teardown still ran. `status` is the last failing per-test status.
    FixtureTeardownFailed {
        test: String,
        status: FixtureStatus,
        report: SuiteReport,
    },
    /// Every test ran but the suite teardown failed; the report was not printed
    TeardownFailed {
        status: FixtureStatus,
        report: SuiteReport,
    },
    /// The run went through and the report was printed
    Completed(SuiteReport),
}

impl SuiteOutcome {
    /// True when nothing failed: an empty suite, or a completed run with no
    /// failed tests
    pub fn passed(&self) -> bool {
        match self {
            SuiteOutcome::Empty => true,
            SuiteOutcome::Completed(report) => report.failed == 0,
            _ => false,
        }
    }

    /// Counts gathered before the run ended, if any test ran
    pub fn report(&self) -> Option<&SuiteReport> {
        match self {
            SuiteOutcome::Empty | SuiteOutcome::SetupFailed { .. } => None,
            SuiteOutcome::FixtureSetupFailed { report, .. }
            | SuiteOutcome::FixtureTeardownFailed { report, .. }
            | SuiteOutcome::TeardownFailed { report, .. }
            | SuiteOutcome::Completed(report) => Some(report),
        }
    }
}

/// Push onto suite storage, doubling capacity with at most
/// [`MAX_GROWTH_STEP`] new slots per step
pub(crate) fn push_with_growth<T>(
    items: &mut Vec<T>,
    item: T,
    what: &'static str,
) -> ClarityResult<()> {
    if items.len() == items.capacity() {
        let step = items.capacity().clamp(INITIAL_CAPACITY, MAX_GROWTH_STEP);
        items
            .try_reserve_exact(step)
            .map_err(|_| ClarityError::OutOfMemory(what))?;
    }
    items.push(item);
    Ok(())
}

/// An ordered collection of tests sharing fixtures and a report
#[derive(Debug)]
pub struct Suite {
    name: String,
    tests: Vec<Test>,
    fixtures: Vec<Fixture>,
    suite_fixture: Option<Fixture>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            fixtures: Vec::new(),
            suite_fixture: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn test(&self, name: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Number of per-test fixtures
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    pub fn has_suite_fixture(&self) -> bool {
        self.suite_fixture.is_some()
    }

    /// Set the suite-wide setup, replacing any earlier one
    pub fn register_setup<F>(&mut self, function: F, data: Option<FixtureData>)
    where
        F: FnMut(DataMut<'_>) -> FixtureStatus + Send + 'static,
    {
        self.suite_fixture
            .get_or_insert_with(Fixture::default)
            .set_setup(Hook::new(function, data));
    }

    /// Set the suite-wide teardown, replacing any earlier one
    pub fn register_teardown<F>(&mut self, function: F, data: Option<FixtureData>)
    where
        F: FnMut(DataMut<'_>) -> FixtureStatus + Send + 'static,
    {
        self.suite_fixture
            .get_or_insert_with(Fixture::default)
            .set_teardown(Hook::new(function, data));
    }

    /// Append a per-test fixture. `None` is accepted and ignored.
    pub fn add_fixture(&mut self, fixture: impl Into<Option<Fixture>>) -> ClarityResult<()> {
        match fixture.into() {
            Some(fixture) => push_with_growth(&mut self.fixtures, fixture, "fixture"),
            None => Ok(()),
        }
    }

    /// Append a test. `None` is accepted and ignored.
    pub fn add_test(&mut self, test: impl Into<Option<Test>>) -> ClarityResult<()> {
        match test.into() {
            Some(test) => push_with_growth(&mut self.tests, test, "test"),
            None => Ok(()),
        }
    }

    /// Run the suite, printing to stdout. Returns true if no test failed and
    /// no fixture reported a failure.
    pub fn run(&mut self) -> bool {
        let mut printer = ConsolePrinter::stdout();
        self.run_with(&mut printer)
    }

    /// Run the suite against the given printer
    pub fn run_with(&mut self, printer: &mut dyn Printer) -> bool {
        self.execute(printer).passed()
    }

    /// Run the suite and return how it ended
    pub fn execute(&mut self, printer: &mut dyn Printer) -> SuiteOutcome {
        let Suite {
            name,
            tests,
            fixtures,
            suite_fixture,
        } = self;

        if tests.is_empty() {
            tracing::debug!(suite = %name, "suite has no tests");
            return SuiteOutcome::Empty;
        }

        tracing::debug!(suite = %name, tests = tests.len(), fixtures = fixtures.len(), "running suite");
        printer.print_suite_name(name);

        if let Some(status) = suite_fixture.as_mut().and_then(Fixture::run_setup) {
            if status != 0 {
                tracing::warn!(suite = %name, status, "suite setup failed");
                return SuiteOutcome::SetupFailed { status };
            }
        }

        let mut report = SuiteReport::new(name);

        for test in tests.iter_mut() {
            for fixture in fixtures.iter_mut() {
                if let Some(status) = fixture.run_setup() {
                    if status != 0 {
                        tracing::warn!(suite = %name, test = %test.name(), status, "fixture setup failed");
                        return SuiteOutcome::FixtureSetupFailed {
                            test: test.name().to_string(),
                            status,
                            report,
                        };
                    }
                }
            }

            let result = test.run();
            printer.print_test_result(result);
            report.record(result);

            let mut teardown_failure = None;
            for fixture in fixtures.iter_mut().rev() {
                if let Some(status) = fixture.run_teardown() {
                    if status != 0 {
                        tracing::warn!(suite = %name, test = %test.name(), status, "fixture teardown failed");
                        teardown_failure = Some(status);
                    }
                }
            }
            if let Some(status) = teardown_failure {
                // Remaining tests are skipped, suite resources are still released
                if let Some(suite_status) = suite_fixture.as_mut().and_then(Fixture::run_teardown)
                {
                    if suite_status != 0 {
                        tracing::warn!(suite = %name, status = suite_status, "suite teardown failed");
                    }
                }
                return SuiteOutcome::FixtureTeardownFailed {
                    test: test.name().to_string(),
                    status,
                    report,
                };
            }
        }

        if let Some(status) = suite_fixture.as_mut().and_then(Fixture::run_teardown) {
            if status != 0 {
                tracing::warn!(suite = %name, status, "suite teardown failed");
                return SuiteOutcome::TeardownFailed { status, report };
            }
        }

        tracing::debug!(
            suite = %name,
            total = report.total,
            failed = report.failed,
            skipped = report.skipped,
            "suite finished"
        );
        printer.print_suite_report(&report);
        SuiteOutcome::Completed(report)
    }
}
