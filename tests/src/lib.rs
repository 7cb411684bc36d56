//! # Document Platform Test Suite
//!
//! Cross-module scenarios exercised end to end through factories,
//! validators, appliers and the in-memory store.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── scenarios/
//!     ├── data_contracts.rs      # contract creation, size, index legality
//!     ├── documents_batch.rs     # duplicates, revisions, id/entropy binding
//!     └── lifecycle.rs           # register, write, replace, delete
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dpp-tests
//!
//! # With pipeline logs
//! RUST_LOG=dpp_core=debug cargo test -p dpp-tests -- --nocapture
//! ```

pub mod scenarios;

use tracing_subscriber::EnvFilter;

/// Installs a test log subscriber filtered by `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
