//! Setup/teardown fixtures

use crate::test::DataMut;
use std::any::Any;
use std::fmt;

/// Opaque user data owned by one half of a fixture
pub type FixtureData = Box<dyn Any + Send>;

/// Status a setup or teardown hook reports; `0` means success
pub type FixtureStatus = i32;

/// A setup or teardown callback
pub trait FixtureFn: Send {
    fn call(&mut self, data: DataMut<'_>) -> FixtureStatus;
}

impl<F> FixtureFn for F
where
    F: FnMut(DataMut<'_>) -> FixtureStatus + Send,
{
    fn call(&mut self, data: DataMut<'_>) -> FixtureStatus {
        self(data)
    }
}

/// One half of a fixture: the callback plus the data it receives
pub struct Hook {
    function: Box<dyn FixtureFn>,
    data: Option<FixtureData>,
}

impl Hook {
    pub fn new<F>(function: F, data: Option<FixtureData>) -> Self
    where
        F: FnMut(DataMut<'_>) -> FixtureStatus + Send + 'static,
    {
        Self {
            function: Box::new(function),
            data,
        }
    }

    fn call(&mut self) -> FixtureStatus {
        self.function.call(self.data.as_deref_mut())
    }
}

/// A setup/teardown pair; either half may be absent
#[derive(Default)]
pub struct Fixture {
    setup: Option<Hook>,
    teardown: Option<Hook>,
}

impl Fixture {
    /// Create a fixture with neither half set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the setup half
    pub fn with_setup<F>(mut self, function: F, data: Option<FixtureData>) -> Self
    where
        F: FnMut(DataMut<'_>) -> FixtureStatus + Send + 'static,
    {
        self.setup = Some(Hook::new(function, data));
        self
    }

    /// Set the teardown half
    pub fn with_teardown<F>(mut self, function: F, data: Option<FixtureData>) -> Self
    where
        F: FnMut(DataMut<'_>) -> FixtureStatus + Send + 'static,
    {
        self.teardown = Some(Hook::new(function, data));
        self
    }

    pub(crate) fn set_setup(&mut self, hook: Hook) {
        self.setup = Some(hook);
    }

    pub(crate) fn set_teardown(&mut self, hook: Hook) {
        self.teardown = Some(hook);
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    pub fn has_teardown(&self) -> bool {
        self.teardown.is_some()
    }

    /// Run the setup half.
    ///
    /// Returns `None` when there is no setup callback, otherwise the status it
    /// reported.
    pub fn run_setup(&mut self) -> Option<FixtureStatus> {
        let status = self.setup.as_mut().map(Hook::call);
        tracing::trace!(?status, "fixture setup");
        status
    }

    /// Run the teardown half.
    ///
    /// Returns `None` when there is no teardown callback, otherwise the status
    /// it reported.
    pub fn run_teardown(&mut self) -> Option<FixtureStatus> {
        let status = self.teardown.as_mut().map(Hook::call);
        tracing::trace!(?status, "fixture teardown");
        status
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("setup", &self.has_setup())
            .field("teardown", &self.has_teardown())
            .finish()
    }
}
