//! Sample test library
//!
//! Registers one suite, `sample`, with a passing and a failing test. The
//! runtime and CLI tests build this crate and load the resulting library.

use clarity::{check_eq, fail_test, register_suite, ClarityResult, Suite, Test};

fn register() -> ClarityResult<()> {
    let mut suite = Suite::new("sample");
    suite.add_test(Test::new("passes", |t, _| check_eq!(t, 2 + 2, 4))?)?;
    suite.add_test(Test::new("fails", |t, _| fail_test!(t, "always fails"))?)?;
    register_suite(suite)
}

clarity::export_tests!(register);
