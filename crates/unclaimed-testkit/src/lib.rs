//! Unclaimed testing infrastructure
//!
//! Deterministic keys, a controllable clock, an in-memory mint-handoff
//! target and a ready-wired registry fixture.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use unclaimed_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     let fx = RegistryFixture::new();
//!     fx.fund_self_claim(&fx.account("alice"), 100);
//!     // ... test logic
//! }
//! ```

pub mod fixtures;
pub mod keys;
pub mod mint;
pub mod time;

pub use fixtures::{RegistryFixture, RegistryFixtureBuilder};
pub use keys::KeyFixture;
pub use mint::InMemoryMint;
pub use time::ManualClock;

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
