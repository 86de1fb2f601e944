//! Registry root
//!
//! Owns governance state, the ledger, the event log and the consumed
//! authorization set behind one lock, plus the mint-handoff target and the
//! clock. Every public mutating call holds the lock for its whole local
//! read-check-write sequence, so each call is a single atomic step. The one
//! exception is the self-claim handoff, which runs with the lock released
//! after the debit has been applied.

use crate::access::AccessGate;
use crate::errors::RegistryResult;
use crate::events::{EventLog, RegistryEvent};
use crate::ledger::{LedgerEntry, RewardLedger};
use crate::mint::MintHandoff;
use crate::replay::ConsumedAuthorizations;
use crate::self_claim::{SelfClaim, SelfClaimReceipt, SelfClaimRequest};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use unclaimed_core::{
    Address, Amount, PhysicalClock, RegistryConfig, ScopeKey, SelfClaimPolicy, SystemClock,
};

#[derive(Debug)]
struct RegistryState {
    gate: AccessGate,
    ledger: RewardLedger,
    events: EventLog,
    consumed: ConsumedAuthorizations,
}

/// Scoped reward registry
pub struct UnclaimedRegistry {
    instance: Address,
    policy: SelfClaimPolicy,
    state: RwLock<RegistryState>,
    mint: Arc<dyn MintHandoff>,
    clock: Arc<dyn PhysicalClock>,
}

impl fmt::Debug for UnclaimedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnclaimedRegistry")
            .field("instance", &self.instance)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl UnclaimedRegistry {
    /// Create a registry from validated configuration, using the system clock
    pub fn new(config: RegistryConfig, mint: Arc<dyn MintHandoff>) -> RegistryResult<Self> {
        Self::with_clock(config, mint, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit clock
    ///
    /// The configured signer and callers are installed as the owner would
    /// install them, so their notifications open the event log.
    pub fn with_clock(
        config: RegistryConfig,
        mint: Arc<dyn MintHandoff>,
        clock: Arc<dyn PhysicalClock>,
    ) -> RegistryResult<Self> {
        config.validate()?;

        let owner = config.owner;
        let mut gate = AccessGate::new(owner);
        let mut events = EventLog::default();
        if let Some(signer) = config.authorized_signer {
            events.emit(gate.change_authorized_signer(&owner, signer)?);
        }
        for caller in &config.authorized_callers {
            events.emit(gate.add_authorized_caller(&owner, *caller)?);
        }

        tracing::info!(
            instance = %config.instance,
            owner = %owner,
            signer = ?config.authorized_signer,
            callers = config.authorized_callers.len(),
            "registry initialized"
        );

        Ok(Self {
            instance: config.instance,
            policy: config.self_claim,
            state: RwLock::new(RegistryState {
                gate,
                ledger: RewardLedger::new(),
                events,
                consumed: ConsumedAuthorizations::default(),
            }),
            mint,
            clock,
        })
    }

    /// Identity of this registry instance
    pub fn instance(&self) -> &Address {
        &self.instance
    }

    /// Self-claim policy in force
    pub fn policy(&self) -> &SelfClaimPolicy {
        &self.policy
    }

    // ------------------------------------------------------------------
    // Governance
    // ------------------------------------------------------------------

    /// Current owner
    pub fn owner(&self) -> Address {
        *self.state.read().gate.owner()
    }

    /// Current authorized signer
    pub fn authorized_signer(&self) -> Option<Address> {
        self.state.read().gate.authorized_signer().copied()
    }

    /// Authorized callers in address order
    pub fn authorized_callers(&self) -> Vec<Address> {
        self.state.read().gate.authorized_callers().copied().collect()
    }

    /// Whether `id` is an authorized caller
    pub fn is_authorized_caller(&self, id: &Address) -> bool {
        self.state.read().gate.is_authorized_caller(id)
    }

    /// Hand ownership to `new_owner` (owner only)
    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> RegistryResult<()> {
        let mut state = self.state.write();
        let event = state.gate.transfer_ownership(caller, new_owner)?;
        state.events.emit(event);
        Ok(())
    }

    /// Replace the authorized signer (owner only)
    pub fn change_authorized_signer(
        &self,
        caller: &Address,
        new_signer: Address,
    ) -> RegistryResult<()> {
        let mut state = self.state.write();
        let event = state.gate.change_authorized_signer(caller, new_signer)?;
        state.events.emit(event);
        Ok(())
    }

    /// Add an authorized caller (owner only, idempotent)
    pub fn add_authorized_caller(&self, caller: &Address, id: Address) -> RegistryResult<()> {
        let mut state = self.state.write();
        let event = state.gate.add_authorized_caller(caller, id)?;
        state.events.emit(event);
        Ok(())
    }

    /// Remove an authorized caller (owner only, idempotent)
    pub fn remove_authorized_caller(&self, caller: &Address, id: &Address) -> RegistryResult<()> {
        let mut state = self.state.write();
        if let Some(event) = state.gate.remove_authorized_caller(caller, id)? {
            state.events.emit(event);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ledger mutations
    // ------------------------------------------------------------------

    /// Credit `amount` to `account` under `key`
    ///
    /// `caller` must be the authorized signer, or an authorized caller with
    /// `declared_signer` equal to the authorized signer.
    pub fn register_reward(
        &self,
        caller: &Address,
        account: &Address,
        amount: Amount,
        key: &ScopeKey,
        declared_signer: &Address,
    ) -> RegistryResult<()> {
        let mut state = self.state.write();
        let grant = state.gate.authorize_mutation(caller, declared_signer)?;
        state.ledger.register_reward(&grant, account, amount, key)?;
        state.events.emit(RegistryEvent::RewardRegistered {
            account: *account,
            amount,
            scope: key.scope.clone(),
            relying_party: key.relying_party,
        });
        Ok(())
    }

    /// Debit `amount` from `account` under `key`
    ///
    /// Same caller rule as [`register_reward`](Self::register_reward); fails
    /// with `InsufficientBalance` when the scoped balance is short.
    pub fn register_claim(
        &self,
        caller: &Address,
        account: &Address,
        amount: Amount,
        key: &ScopeKey,
        declared_signer: &Address,
    ) -> RegistryResult<()> {
        let mut state = self.state.write();
        let grant = state.gate.authorize_mutation(caller, declared_signer)?;
        state.ledger.register_claim(&grant, account, amount, key)?;
        state.events.emit(RegistryEvent::ClaimRegistered {
            account: *account,
            amount,
            scope: key.scope.clone(),
            relying_party: key.relying_party,
        });
        Ok(())
    }

    /// End-user claim authorized by a detached signature
    ///
    /// Anyone may submit; the signature must come from the authorized signer
    /// over `(this instance, to, amount, param, timestamp)`. On success the
    /// scoped balance under `("self-claim", param)` drops by `amount` and the
    /// mint-handoff target credits `to` with the same amount.
    ///
    /// The `ClaimRegistered` notification is appended after the handoff
    /// returns. Events from calls that run during the handoff, re-entrant or
    /// concurrent, can therefore precede it even though its debit came first.
    pub fn self_claim(&self, request: SelfClaimRequest) -> RegistryResult<SelfClaimReceipt> {
        let mut claim = SelfClaim::receive(self.instance, request)?;
        let now = self.policy.has_window().then(|| self.clock.now_secs());

        {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let grant = claim.verify(&state.gate, &self.policy, now, &state.consumed)?;
            claim.debit(&grant, &mut state.ledger, &self.policy, &mut state.consumed)?;
        }

        // Local effects are committed and the lock is released; the mint
        // target may re-enter and will see the debited balance.
        if let Err(err) = claim.credit(&self.instance, self.mint.as_ref()) {
            let mut guard = self.state.write();
            let state = &mut *guard;
            return Err(claim.rollback(&mut state.ledger, &mut state.consumed, err));
        }

        let mut state = self.state.write();
        claim.complete(&mut state.events)
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Aggregate unclaimed balance
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().ledger.balance_of(account)
    }

    /// Scoped unclaimed balance
    pub fn balance_of_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.state.read().ledger.balance_of_by_scope(account, key)
    }

    /// Aggregate earned total
    pub fn earned(&self, account: &Address) -> Amount {
        self.state.read().ledger.earned(account)
    }

    /// Scoped earned total
    pub fn earned_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.state.read().ledger.earned_by_scope(account, key)
    }

    /// Aggregate claimed total
    pub fn claimed(&self, account: &Address) -> Amount {
        self.state.read().ledger.claimed(account)
    }

    /// Scoped claimed total
    pub fn claimed_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.state.read().ledger.claimed_by_scope(account, key)
    }

    /// Every scoped entry held for `account`
    pub fn scopes_of(&self, account: &Address) -> Vec<(ScopeKey, LedgerEntry)> {
        self.state
            .read()
            .ledger
            .scopes_of(account)
            .map(|(key, entry)| (key.clone(), *entry))
            .collect()
    }

    /// Whether `account`'s aggregate and scoped entries agree
    pub fn is_consistent(&self, account: &Address) -> bool {
        self.state.read().ledger.is_consistent(account)
    }

    /// Events emitted so far, in the order they were appended
    ///
    /// Append order is completion order. A self-claim's `ClaimRegistered`
    /// is appended once its handoff succeeds, which may be after events of
    /// operations that began later; see [`self_claim`](Self::self_claim).
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.state.read().events.as_slice().to_vec()
    }

    /// Take the emitted events, leaving the log empty
    pub fn drain_events(&self) -> Vec<RegistryEvent> {
        self.state.write().events.drain()
    }

    /// Number of self-claim authorizations recorded as consumed
    pub fn consumed_authorizations(&self) -> usize {
        self.state.read().consumed.len()
    }
}
