//! Linking a test library to the host's registry
//!
//! A test library built as a `cdylib` carries its own copy of this crate,
//! and with it its own registry. Before the registration entry point runs,
//! the host passes the library a [`HostBinding`] through [`BIND_SYMBOL`].
//! From then on [`register_suite`](crate::register_suite) inside the library
//! hands every suite to the host instead of keeping it.
//!
//! Suites cross the boundary as boxed Rust values. The library must be built
//! by the same compiler against the same clarity version and use the default
//! global allocator; a binding from a host whose version or [`Suite`] layout
//! differs is refused.

use crate::error::ClarityError;
use crate::registry::registry;
use crate::suite::Suite;
use crate::VERSION;
use once_cell::sync::OnceCell;
use std::ffi::c_void;

/// Optional second entry point, generated by [`export_tests!`](crate::export_tests)
pub const BIND_SYMBOL: &str = "clarity_bind_host";

/// Signature of [`BIND_SYMBOL`]. Returns `0` once bound.
pub type BindFn = unsafe extern "C" fn(binding: *const HostBinding) -> i32;

type AcceptSuiteFn = extern "C" fn(suite: *mut c_void) -> i32;
type ReportFn = extern "C" fn(message: *const u8, len: usize);

/// The host side of a library's registration, laid out for a C call
#[repr(C)]
pub struct HostBinding {
    version: *const u8,
    version_len: usize,
    suite_size: usize,
    accept_suite: AcceptSuiteFn,
    report_failure: ReportFn,
}

#[derive(Clone, Copy)]
struct Host {
    accept_suite: AcceptSuiteFn,
    report_failure: ReportFn,
}

static HOST: OnceCell<Host> = OnceCell::new();

impl HostBinding {
    /// Binding that routes suites into this process's registry
    pub fn current() -> Self {
        Self {
            version: VERSION.as_ptr(),
            version_len: VERSION.len(),
            suite_size: std::mem::size_of::<Suite>(),
            accept_suite,
            report_failure,
        }
    }

    fn matches_this_build(&self) -> bool {
        if self.version.is_null() {
            return false;
        }
        let version = unsafe { std::slice::from_raw_parts(self.version, self.version_len) };
        version == VERSION.as_bytes() && self.suite_size == std::mem::size_of::<Suite>()
    }
}

extern "C" fn accept_suite(suite: *mut c_void) -> i32 {
    if suite.is_null() {
        return ClarityError::InvalidArgument("null suite".to_string()).status_code();
    }
    let suite = unsafe { Box::from_raw(suite.cast::<Suite>()) };
    match registry().add_suite(*suite) {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!(error = %e, "test library suite rejected");
            e.status_code()
        }
    }
}

extern "C" fn report_failure(message: *const u8, len: usize) {
    if message.is_null() {
        return;
    }
    let bytes = unsafe { std::slice::from_raw_parts(message, len) };
    let message = String::from_utf8_lossy(bytes);
    tracing::warn!(error = %message, "test library failed to register its suites");
}

/// Library side of [`BIND_SYMBOL`].
///
/// # Safety
///
/// `binding` must be null or point at a live [`HostBinding`].
#[doc(hidden)]
pub unsafe fn bind(binding: *const HostBinding) -> i32 {
    let Some(binding) = binding.as_ref() else {
        return ClarityError::InvalidArgument("null host binding".to_string()).status_code();
    };
    if !binding.matches_this_build() {
        return ClarityError::LoadLibraryFailed {
            path: Default::default(),
            reason: "host runs a different clarity build".to_string(),
        }
        .status_code();
    }

    // A second bind comes from the same host; the first one stays.
    let _ = HOST.set(Host {
        accept_suite: binding.accept_suite,
        report_failure: binding.report_failure,
    });
    0
}

/// Hand `suite` to the bound host. Gives the suite back when unbound.
pub(crate) fn forward_suite(suite: Suite) -> Result<i32, Suite> {
    let Some(host) = HOST.get() else {
        return Err(suite);
    };
    let raw = Box::into_raw(Box::new(suite));
    Ok((host.accept_suite)(raw.cast::<c_void>()))
}

/// Report a registration error to the bound host. False when unbound.
pub(crate) fn forward_failure(error: &ClarityError) -> bool {
    let Some(host) = HOST.get() else {
        return false;
    };
    let message = error.to_string();
    (host.report_failure)(message.as_ptr(), message.len());
    true
}
