//! Shared proptest configuration.
//!
//! The default case count depends on the test tier selected through Cargo
//! features:
//!
//! | Tier     | Feature Flag  | Default Cases |
//! |----------|---------------|---------------|
//! | Fast     | `test-fast`   | 10            |
//! | Standard | (default)     | 50            |
//! | Full     | `test-full`   | 500           |
//!
//! The `PROPTEST_CASES` environment variable overrides the tier default:
//!
//! ```bash
//! PROPTEST_CASES=100 cargo test
//! ```
//!
//! Async property tests should drive a `TestRunner` from a single runtime
//! created once per test function:
//!
//! ```no_run
//! use aml_ledger_test_fixtures::proptest_config::proptest_config;
//! use proptest::{prelude::*, test_runner::TestRunner};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let mut runner = TestRunner::new(proptest_config());
//! runner.run(&any::<u32>(), |_input| {
//!     rt.block_on(async { Ok(()) })
//! }).unwrap();
//! ```

use proptest::test_runner::Config as ProptestConfig;

/// Default number of proptest cases for the active tier.
pub const DEFAULT_PROPTEST_CASES: u32 = if cfg!(feature = "test-fast") {
    10
} else if cfg!(feature = "test-full") {
    500
} else {
    50
};

/// Number of cases to run, from `PROPTEST_CASES` or the tier default.
#[must_use]
pub fn test_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_PROPTEST_CASES)
}

/// Proptest configuration with [`test_cases`] cases.
#[must_use]
pub fn proptest_config() -> ProptestConfig {
    ProptestConfig::with_cases(test_cases())
}
