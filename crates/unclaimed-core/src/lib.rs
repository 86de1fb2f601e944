//! Core types for the unclaimed rewards registry
//!
//! Shared by the registry and its test infrastructure:
//! - identities and scope classification (`Address`, `ScopeLabel`, `ScopeKey`)
//! - SHA-256 hashing (`hash`, `Hash32`)
//! - the unified `CoreError`
//! - TOML configuration with environment overrides
//! - the physical clock seam

/// Registry configuration and validation
pub mod config;
/// Unified error type
pub mod errors;
/// Pure hashing helpers
pub mod hash;
/// Identity and classification types
pub mod identifiers;
/// Wall-clock time source
pub mod time;

pub use config::{RegistryConfig, SelfClaimPolicy};
pub use errors::{CoreError, CoreResult};
pub use hash::Hash32;
pub use identifiers::{Address, Amount, ScopeKey, ScopeLabel, UnixSeconds};
pub use time::{PhysicalClock, SystemClock};
