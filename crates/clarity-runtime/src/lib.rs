//! Clarity - a minimal unit-testing framework
//!
//! This library provides:
//! - Tests with a pass/fail/skip result state machine
//! - Setup/teardown fixtures, suite-wide or around every test
//! - Suites that run tests in order and aggregate a report
//! - Console and JSON printers
//! - Loading of tests from dynamic libraries and a process-wide registry
//!
//! ```
//! use clarity::{check_eq, ConsolePrinter, PrinterConfig, Suite, Test};
//!
//! let mut suite = Suite::new("math");
//! suite
//!     .add_test(Test::new("adds", |t, _| check_eq!(t, 1 + 1, 2)).unwrap())
//!     .unwrap();
//!
//! let mut printer = ConsolePrinter::new(Vec::new(), PrinterConfig::plain());
//! assert!(suite.run_with(&mut printer));
//! ```

/// Clarity runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod fixture;
pub mod host;
pub mod loader;
pub mod macros;
pub mod printer;
pub mod registry;
pub mod suite;
pub mod test;

pub use error::{ClarityError, ClarityResult};
pub use fixture::{Fixture, FixtureData, FixtureFn, FixtureStatus};
pub use host::{BindFn, HostBinding, BIND_SYMBOL};
pub use loader::{
    DynamicLoader, LibraryResolver, ModuleLoader, PendingLibrary, RegisterFn, TestLibraries,
    REGISTER_SYMBOL,
};
pub use printer::{ConsolePrinter, JsonPrinter, Printer, PrinterConfig};
pub use registry::{
    add_library_search_path, load_tests, loaded_library_count, register_suite, registry,
    run_registered, run_tests, unload_tests, Registry,
};
pub use suite::{Suite, SuiteOutcome, SuiteReport, MAX_GROWTH_STEP};
pub use test::{DataMut, Test, TestData, TestFn, TestHandle, TestResult};
