//! Test body sugar
//!
//! Every macro takes the [`TestHandle`](crate::TestHandle) first, records the
//! call site, marks the outcome and returns from the enclosing test body.

/// Fail the running test with a formatted message and return
///
/// ```
/// use clarity::{fail_test, Test};
///
/// let mut test = Test::new("divides", |t, _| {
///     let divisor = 0;
///     if divisor == 0 {
///         fail_test!(t, "divisor is {}", divisor);
///     }
///     unreachable!();
/// })
/// .unwrap();
/// assert!(test.run().is_fail());
/// ```
#[macro_export]
macro_rules! fail_test {
    ($handle:expr, $($arg:tt)+) => {{
        $handle.mark_point(file!(), line!());
        $handle.mark_failed(format!($($arg)+));
        return;
    }};
}

/// Skip the running test with a formatted message and return
#[macro_export]
macro_rules! skip_test {
    ($handle:expr, $($arg:tt)+) => {{
        $handle.mark_point(file!(), line!());
        $handle.mark_skipped(format!($($arg)+));
        return;
    }};
}

/// Fail and return unless `cond` holds
#[macro_export]
macro_rules! check {
    ($handle:expr, $cond:expr $(,)?) => {
        if !$cond {
            $crate::fail_test!($handle, "check failed: {}", stringify!($cond));
        }
    };
    ($handle:expr, $cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::fail_test!($handle, $($arg)+);
        }
    };
}

/// Fail and return unless both sides compare equal
#[macro_export]
macro_rules! check_eq {
    ($handle:expr, $left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    $crate::fail_test!(
                        $handle,
                        "check failed: {} == {} (left: {:?}, right: {:?})",
                        stringify!($left),
                        stringify!($right),
                        left,
                        right
                    );
                }
            }
        }
    };
}

/// Export the entry points of a test library.
///
/// `$register` is a `fn() -> ClarityResult<()>` that registers the library's
/// suites, normally through [`register_suite`](crate::register_suite). Build
/// the library as a `cdylib`: the host binds it before calling
/// `clarity_register_tests`, so the suites land in the host's registry even
/// though the library links its own copy of clarity. Library and host must
/// be built against the same clarity version by the same compiler.
///
/// ```ignore
/// fn register() -> clarity::ClarityResult<()> {
///     let mut suite = clarity::Suite::new("math");
///     suite.add_test(clarity::Test::new("adds", |t, _| clarity::check_eq!(t, 1 + 1, 2))?)?;
///     clarity::register_suite(suite)
/// }
///
/// clarity::export_tests!(register);
/// ```
#[macro_export]
macro_rules! export_tests {
    ($register:path) => {
        /// Route this library's suites to the host that loaded it.
        ///
        /// # Safety
        ///
        /// `binding` must be null or point at a live host binding.
        #[no_mangle]
        pub unsafe extern "C" fn clarity_bind_host(
            binding: *const $crate::host::HostBinding,
        ) -> i32 {
            $crate::host::bind(binding)
        }

        #[no_mangle]
        pub extern "C" fn clarity_register_tests() {
            if let Err(error) = $register() {
                $crate::registry::registration_failed(&error);
            }
        }
    };
}
