//! Shared test fixtures for the oracle workspace: recorded mainnet bytes,
//! a deterministic synthetic-day builder, and test environment setup.

use std::sync::Once;

pub mod synthetic;
pub mod vectors;

static INIT: Once = Once::new();

/// Initialize tracing for a test, once per process.
///
/// Reads `RUST_LOG` so a failing test can be re-run with full parser
/// tracing without editing the test.
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            )
            .with_test_writer()
            .try_init();
    });
}
