//! Mint-handoff seam
//!
//! A successful self-claim credits the claimed amount to a companion ledger
//! that can mint. Only its credit interface is consumed here; the target
//! decides for itself which identities may mint.

use serde::{Deserialize, Serialize};
use unclaimed_core::{Address, Amount};

/// Errors reported by a mint-handoff target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MintError {
    /// The calling identity is not registered as a minter on the target
    #[error("caller is not an authorized minter")]
    UnauthorizedMinter,

    /// Crediting would overflow the target's balance
    #[error("mint amount overflow")]
    Overflow,

    /// Any other refusal
    #[error("mint rejected: {reason}")]
    Rejected {
        /// Target-supplied reason
        reason: String,
    },
}

/// Credit interface of the mint-handoff target
///
/// `minter` is the identity of the registry instance making the call. The
/// registry releases its own lock before calling `credit`, so an
/// implementation may call back into the registry.
pub trait MintHandoff: Send + Sync {
    /// Credit `amount` to `account`
    fn credit(&self, minter: &Address, account: &Address, amount: Amount) -> Result<(), MintError>;
}
