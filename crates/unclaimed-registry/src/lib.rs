//! Scoped reward-accrual ledger with delegated, signature-based claims
//!
//! Rewards are earned per account under a `(scope, relying party)` key and
//! later claimed against the scoped balance. Two ways in:
//!
//! - the authorized signer, or an authorized caller declaring it, calls
//!   [`UnclaimedRegistry::register_reward`] and
//!   [`UnclaimedRegistry::register_claim`] directly;
//! - an end user submits a [`SelfClaimRequest`] carrying a detached
//!   signature from the authorized signer, and the registry debits the
//!   `"self-claim"` scope and credits the mint-handoff target.
//!
//! ```rust,ignore
//! let registry = UnclaimedRegistry::new(config, mint)?;
//! let invite = scope_key("invite", relying_party)?;
//! registry.register_reward(&signer, &alice, 100, &invite, &signer)?;
//! assert_eq!(registry.balance_of_by_scope(&alice, &invite), 100);
//! ```

/// Governance owner, authorized signer and authorized callers
pub mod access;
/// Self-claim message encoding and signature verification
pub mod authorization;
/// Registry error taxonomy
pub mod errors;
/// Emitted notifications
pub mod events;
/// Scoped earned/claimed accounting
pub mod ledger;
/// Mint-handoff target interface
pub mod mint;
/// Registry root
pub mod registry;
/// Freshness window and consumed-authorization tracking
pub mod replay;
/// Self-claim state machine
pub mod self_claim;

pub use access::{AccessGate, MutationAuthority, MutationGrant};
pub use authorization::{
    message_hash, signer_address, verify, AuthorizationMessage, SignatureBytes,
};
pub use errors::{RegistryError, RegistryResult};
pub use events::{EventLog, RegistryEvent};
pub use ledger::{scope_key, LedgerEntry, RewardLedger};
pub use mint::{MintError, MintHandoff};
pub use registry::UnclaimedRegistry;
pub use self_claim::{
    self_claim_key, SelfClaim, SelfClaimReceipt, SelfClaimRequest, SelfClaimState,
    SELF_CLAIM_SCOPE,
};

pub use unclaimed_core::{
    Address, Amount, Hash32, RegistryConfig, ScopeKey, ScopeLabel, SelfClaimPolicy,
};
