//! Tests and their result state machine
//!
//! A [`Test`] pairs a named callable with optional user data and owns the
//! [`TestResult`] its body writes through a [`TestHandle`]. A result starts
//! out passing; the body moves it to failed or skipped by calling
//! [`TestHandle::mark_failed`] or [`TestHandle::mark_skipped`], normally right
//! after [`TestHandle::mark_point`] so the report carries the call site.
//!
//! Marking an outcome does not transfer control. The body keeps running
//! until it returns; the [`fail_test!`](crate::fail_test) and
//! [`skip_test!`](crate::skip_test) macros mark and return in one step.

use crate::error::{ClarityError, ClarityResult};
use serde::Serialize;
use std::any::Any;
use std::fmt;

/// Opaque user data handed to a test body on every run
pub type TestData = Box<dyn Any + Send>;

/// Borrowed view of user data as seen by test bodies and fixture hooks
pub type DataMut<'a> = Option<&'a mut (dyn Any + Send + 'static)>;

/// Outcome record attached to a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    /// Name of the test this result belongs to
    pub name: String,
    /// File of the most recent mark point
    pub file: Option<String>,
    /// Line of the most recent mark point
    pub line: u32,
    /// False once the body called `mark_failed`
    pub passed: bool,
    /// True once the body called `mark_skipped`
    pub skipped: bool,
    /// Message given to the last `mark_failed`/`mark_skipped`
    pub error_message: Option<String>,
}

impl TestResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file: None,
            line: 0,
            passed: true,
            skipped: false,
            error_message: None,
        }
    }

    /// Check if this result counts as a pass
    pub fn is_pass(&self) -> bool {
        !self.skipped && self.passed
    }

    /// Check if this result counts as a failure
    pub fn is_fail(&self) -> bool {
        !self.skipped && !self.passed
    }

    /// Check if this result counts as a skip
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }
}

/// Handle through which a running test body records its outcome
pub struct TestHandle<'a> {
    result: &'a mut TestResult,
}

impl<'a> TestHandle<'a> {
    pub(crate) fn new(result: &'a mut TestResult) -> Self {
        Self { result }
    }

    /// Name of the running test
    pub fn name(&self) -> &str {
        &self.result.name
    }

    /// Record the source location of the next outcome mark
    pub fn mark_point(&mut self, file: &str, line: u32) {
        self.result.file = Some(file.to_string());
        self.result.line = line;
    }

    /// Mark the test as failed.
    ///
    /// The body is expected to return right after this call.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.result.passed = false;
        self.result.error_message = Some(message.into());
    }

    /// Mark the test as skipped. Later runs will not invoke the body again.
    ///
    /// The body is expected to return right after this call.
    pub fn mark_skipped(&mut self, message: impl Into<String>) {
        self.result.skipped = true;
        self.result.error_message = Some(message.into());
    }

    /// Result as recorded so far
    pub fn result(&self) -> &TestResult {
        self.result
    }
}

/// A callable test body
///
/// Implemented for every `FnMut(&mut TestHandle, DataMut)`
/// closure; implement it directly for stateful test objects.
pub trait TestFn: Send {
    fn invoke(&mut self, handle: &mut TestHandle<'_>, data: DataMut<'_>);
}

impl<F> TestFn for F
where
    F: FnMut(&mut TestHandle<'_>, DataMut<'_>) + Send,
{
    fn invoke(&mut self, handle: &mut TestHandle<'_>, data: DataMut<'_>) {
        self(handle, data)
    }
}

/// A named unit of work plus the result of its most recent run
pub struct Test {
    name: String,
    function: Box<dyn TestFn>,
    data: Option<TestData>,
    result: TestResult,
}

impl Test {
    /// Create a test from a closure or function
    pub fn new<F>(name: impl Into<String>, function: F) -> ClarityResult<Self>
    where
        F: FnMut(&mut TestHandle<'_>, DataMut<'_>) + Send + 'static,
    {
        Self::from_callable(name, Box::new(function))
    }

    /// Create a test from any [`TestFn`] implementation
    pub fn from_callable(name: impl Into<String>, function: Box<dyn TestFn>) -> ClarityResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClarityError::InvalidArgument(
                "test name cannot be empty".to_string(),
            ));
        }

        let result = TestResult::new(&name);
        Ok(Self {
            name,
            function,
            data: None,
            result,
        })
    }

    /// Attach user data passed to the body on every run
    pub fn with_data<T: Any + Send>(mut self, data: T) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&(dyn Any + Send + 'static)> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> DataMut<'_> {
        self.data.as_deref_mut()
    }

    /// Result of the most recent run (or the initial passing result)
    pub fn result(&self) -> &TestResult {
        &self.result
    }

    /// Run the test body once and return its result.
    ///
    /// A test already marked skipped is not invoked again. The result is not
    /// reset between runs: a re-run overwrites whatever the body marks.
    pub fn run(&mut self) -> &TestResult {
        if self.result.skipped {
            tracing::debug!(test = %self.name, "test already skipped, not invoking");
            return &self.result;
        }

        tracing::trace!(test = %self.name, "invoking test");
        let Test {
            function,
            data,
            result,
            ..
        } = &mut *self;
        let mut handle = TestHandle::new(result);
        function.invoke(&mut handle, data.as_deref_mut());

        &self.result
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("has_data", &self.data.is_some())
            .field("result", &self.result)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop(_: &mut TestHandle<'_>, _: DataMut<'_>) {}

    #[test]
    fn test_fresh_test_passes() {
        let test = Test::new("fresh", noop).unwrap();
        assert_eq!(test.name(), "fresh");
        assert!(test.result().passed);
        assert!(!test.result().skipped);
        assert!(test.result().error_message.is_none());
        assert!(test.data().is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Test::new("", noop);
        assert!(matches!(result, Err(ClarityError::InvalidArgument(_))));
    }

    #[test]
    fn test_run_reinvokes_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut test = Test::new("counted", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        test.run();
        test.run();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(test.result().is_pass());
    }

    #[test]
    fn test_mark_failed_records_location() {
        let mut test = Test::new("failing", |t, _| {
            t.mark_point("math.rs", 42);
            t.mark_failed("boom");
        })
        .unwrap();

        let result = test.run();
        assert!(result.is_fail());
        assert_eq!(result.file.as_deref(), Some("math.rs"));
        assert_eq!(result.line, 42);
        assert_eq!(result.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_skip_is_sticky() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut test = Test::new("skipping", move |t, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            t.mark_skipped("not today");
        })
        .unwrap();

        let first = test.run().clone();
        let second = test.run().clone();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(first.is_skipped());
        assert_eq!(first, second);
    }

    #[test]
    fn test_mark_does_not_stop_body() {
        let mut test = Test::new("keeps-going", |t, _| {
            t.mark_failed("first");
            t.mark_failed("second");
        })
        .unwrap();

        assert_eq!(test.run().error_message.as_deref(), Some("second"));
    }

    #[test]
    fn test_rerun_overwrites_message() {
        let mut attempt = 0;
        let mut test = Test::new("flaky", move |t, _| {
            attempt += 1;
            t.mark_failed(format!("attempt {}", attempt));
        })
        .unwrap();

        test.run();
        assert_eq!(test.run().error_message.as_deref(), Some("attempt 2"));
    }

    #[test]
    fn test_data_reaches_body() {
        let mut test = Test::new("with-data", |t, data| {
            let Some(value) = data.and_then(|d| d.downcast_mut::<u32>()) else {
                t.mark_failed("missing data");
                return;
            };
            *value += 1;
        })
        .unwrap()
        .with_data(41u32);

        assert!(test.run().is_pass());
        let value = test.data().and_then(|d| d.downcast_ref::<u32>());
        assert_eq!(value, Some(&42));
    }
}
