//! Tracing initialisation helpers for tests.
//!
//! Call [`init_test_tracing`] at the top of any test that emits tracing events
//! and wants them captured by the test harness.
//!
//! The subscriber is initialised at most once per process, so it is safe to
//! call from every test function.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: resolver and optimizer stages at
/// debug, everything else at warn.
pub const DEFAULT_TEST_FILTER: &str = "warn,mentionctx_core=debug";

/// Initialise a tracing subscriber that writes to the test-harness writer
/// and respects the `RUST_LOG` environment variable.
///
/// # Example
///
/// ```ignore
/// #[tokio::test]
/// async fn my_test() {
///     mentionctx_test_utils::tracing_setup::init_test_tracing();
///     tracing::debug!("visible in captured test output");
/// }
/// ```
pub fn init_test_tracing() {
    init_test_tracing_with(DEFAULT_TEST_FILTER);
}

/// Like [`init_test_tracing`], with an explicit fallback filter.
pub fn init_test_tracing_with(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
