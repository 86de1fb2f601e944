//! Registry notifications
//!
//! Events are appended in emission order and only for operations that
//! complete; a rejected call leaves the log untouched. Amounts are encoded
//! as decimal strings in JSON.

use serde::{Deserialize, Serialize};
use unclaimed_core::identifiers::amount_string;
use unclaimed_core::{Address, Amount, ScopeLabel};

/// Notification emitted by a completed registry operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// Ownership moved to a new identity
    OwnershipTransferred {
        /// Owner before the transfer
        previous: Address,
        /// Owner after the transfer
        new: Address,
    },

    /// Authorized signer replaced
    AuthorizedSignerChanged {
        /// The new signer
        signer: Address,
    },

    /// Identity added to the authorized caller set
    AuthorizedCallerAdded {
        /// The added caller
        caller: Address,
    },

    /// Identity removed from the authorized caller set
    AuthorizedCallerRemoved {
        /// The removed caller
        caller: Address,
    },

    /// Reward credited to an account under a scope
    RewardRegistered {
        /// Credited account
        account: Address,
        /// Credited amount
        #[serde(with = "amount_string")]
        amount: Amount,
        /// Scope label
        scope: ScopeLabel,
        /// Relying party the reward is tracked for
        relying_party: Address,
    },

    /// Claim debited from an account under a scope
    ClaimRegistered {
        /// Debited account
        account: Address,
        /// Debited amount
        #[serde(with = "amount_string")]
        amount: Amount,
        /// Scope label
        scope: ScopeLabel,
        /// Relying party the claim is tracked for
        relying_party: Address,
    },
}

impl RegistryEvent {
    /// Event name for log keying
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::OwnershipTransferred { .. } => "ownership_transferred",
            RegistryEvent::AuthorizedSignerChanged { .. } => "authorized_signer_changed",
            RegistryEvent::AuthorizedCallerAdded { .. } => "authorized_caller_added",
            RegistryEvent::AuthorizedCallerRemoved { .. } => "authorized_caller_removed",
            RegistryEvent::RewardRegistered { .. } => "reward_registered",
            RegistryEvent::ClaimRegistered { .. } => "claim_registered",
        }
    }

    /// Account affected by a ledger event
    pub fn account(&self) -> Option<&Address> {
        match self {
            RegistryEvent::RewardRegistered { account, .. }
            | RegistryEvent::ClaimRegistered { account, .. } => Some(account),
            _ => None,
        }
    }

    /// JSON encoding, as handed to external indexers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Append-only log of emitted events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<RegistryEvent>,
}

impl EventLog {
    /// Append an event and trace it
    pub fn emit(&mut self, event: RegistryEvent) {
        tracing::info!(event = event.name(), ?event, "registry event");
        self.events.push(event);
    }

    /// Events emitted so far
    pub fn as_slice(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Take all events, leaving the log empty
    pub fn drain(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_tagged() {
        let event = RegistryEvent::RewardRegistered {
            account: Address::new([1; 32]),
            amount: 100,
            scope: ScopeLabel::new("invite").unwrap(),
            relying_party: Address::new([2; 32]),
        };
        let json = event.to_json().unwrap();
        assert!(json.contains("\"event\":\"reward_registered\""));
        assert!(json.contains("\"scope\":\"invite\""));
        assert!(json.contains("\"amount\":\"100\""));
        let back: RegistryEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_full_range_amount_round_trips() {
        let event = RegistryEvent::ClaimRegistered {
            account: Address::new([1; 32]),
            amount: Amount::MAX,
            scope: ScopeLabel::new("self-claim").unwrap(),
            relying_party: Address::new([2; 32]),
        };
        let back: RegistryEvent = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::default();
        log.emit(RegistryEvent::AuthorizedCallerAdded {
            caller: Address::new([3; 32]),
        });
        assert_eq!(log.len(), 1);
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }
}
