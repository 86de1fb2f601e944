//! Registry error taxonomy
//!
//! Every failure aborts the whole operation with no state change. Each
//! variant carries a stable reason code so callers can assert on cause
//! without matching on display text.

use crate::mint::MintError;
use serde::{Deserialize, Serialize};
use unclaimed_core::{Amount, CoreError};

/// Registry operation errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RegistryError {
    /// Caller is not the governance owner
    #[error("caller is not the owner")]
    NotOwner,

    /// Caller is neither the authorized signer nor an authorized caller
    /// declaring it
    #[error("not authorized to register")]
    NotAuthorized,

    /// Self-claim signature does not come from the authorized signer
    #[error("invalid signer")]
    InvalidSigner,

    /// Requested amount exceeds the scoped balance
    #[error("not enough balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Scoped balance at the time of the call
        available: Amount,
        /// Amount the caller asked for
        requested: Amount,
    },

    /// A running total would exceed `Amount::MAX`
    #[error("amount overflow")]
    Overflow,

    /// Scope label failed validation
    #[error("invalid scope: {message}")]
    InvalidScope {
        /// Why the label was rejected
        message: String,
    },

    /// The all-zero address was supplied where a real identity is required
    #[error("zero address is not a valid {field}")]
    InvalidAddress {
        /// Role the address was meant to fill
        field: String,
    },

    /// Authorization timestamp is outside the configured age window
    #[error("authorization expired: issued at {timestamp}, now {now}")]
    AuthorizationExpired {
        /// Timestamp bound into the signed message
        timestamp: u64,
        /// Local clock reading
        now: u64,
    },

    /// Authorization timestamp is further in the future than the allowed skew
    #[error("authorization not yet valid: issued at {timestamp}, now {now}")]
    AuthorizationNotYetValid {
        /// Timestamp bound into the signed message
        timestamp: u64,
        /// Local clock reading
        now: u64,
    },

    /// This exact authorization has already been consumed
    #[error("authorization already used")]
    AuthorizationReplayed,

    /// The mint-handoff target refused the credit; the local debit was undone
    #[error("mint handoff failed: {0}")]
    MintFailed(MintError),

    /// A self-claim step was invoked from the wrong state
    #[error("invalid self-claim transition from {from} to {to}")]
    InvalidTransition {
        /// State the claim was in
        from: String,
        /// State the step would have entered
        to: String,
    },

    /// Underlying core error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RegistryError {
    /// Stable reason identifier
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::NotOwner => "NOT_OWNER",
            RegistryError::NotAuthorized => "NOT_AUTHORIZED",
            RegistryError::InvalidSigner => "INVALID_SIGNER",
            RegistryError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            RegistryError::Overflow => "OVERFLOW",
            RegistryError::InvalidScope { .. } => "INVALID_SCOPE",
            RegistryError::InvalidAddress { .. } => "INVALID_ADDRESS",
            RegistryError::AuthorizationExpired { .. } => "AUTHORIZATION_EXPIRED",
            RegistryError::AuthorizationNotYetValid { .. } => "AUTHORIZATION_NOT_YET_VALID",
            RegistryError::AuthorizationReplayed => "AUTHORIZATION_REPLAYED",
            RegistryError::MintFailed(_) => "MINT_FAILED",
            RegistryError::InvalidTransition { .. } => "INVALID_TRANSITION",
            RegistryError::Core(_) => "CORE",
        }
    }

    /// Governance errors: the caller lacks the owner identity
    pub fn is_governance(&self) -> bool {
        matches!(self, RegistryError::NotOwner)
    }

    /// Authorization errors: caller or signer does not match
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            RegistryError::NotAuthorized
                | RegistryError::InvalidSigner
                | RegistryError::AuthorizationExpired { .. }
                | RegistryError::AuthorizationNotYetValid { .. }
                | RegistryError::AuthorizationReplayed
        )
    }

    /// Accounting errors: recoverable by retrying with a smaller amount or
    /// after a new reward
    pub fn is_accounting(&self) -> bool {
        matches!(
            self,
            RegistryError::InsufficientBalance { .. } | RegistryError::Overflow
        )
    }
}

/// Standard Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            RegistryError::NotOwner,
            RegistryError::NotAuthorized,
            RegistryError::InvalidSigner,
            RegistryError::InsufficientBalance {
                available: 1,
                requested: 2,
            },
            RegistryError::Overflow,
            RegistryError::InvalidScope {
                message: String::new(),
            },
            RegistryError::InvalidAddress {
                field: "owner".into(),
            },
            RegistryError::AuthorizationExpired {
                timestamp: 0,
                now: 1,
            },
            RegistryError::AuthorizationNotYetValid {
                timestamp: 1,
                now: 0,
            },
            RegistryError::AuthorizationReplayed,
            RegistryError::MintFailed(MintError::UnauthorizedMinter),
            RegistryError::InvalidTransition {
                from: "received".into(),
                to: "debited".into(),
            },
            RegistryError::Core(CoreError::invalid("x")),
        ];
        let mut codes: Vec<_> = errors.iter().map(RegistryError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_taxonomy() {
        assert!(RegistryError::NotOwner.is_governance());
        assert!(RegistryError::InvalidSigner.is_authorization());
        assert!(RegistryError::InsufficientBalance {
            available: 0,
            requested: 1
        }
        .is_accounting());
        assert!(!RegistryError::NotAuthorized.is_accounting());
    }
}
