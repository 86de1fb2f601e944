//! Self-claim state machine
//!
//! ```text
//! Received -> Verified -> Debited -> Credited -> Complete
//!     \           \
//!      +-----------+--> Rejected
//! ```
//!
//! Local effects (the ledger debit and, if enabled, the consumed-set entry)
//! are applied in `Debited`, before the mint handoff is invoked in
//! `Credited`. A failed handoff is compensated by [`SelfClaim::rollback`],
//! so the operation as a whole either applies everything or nothing.
//!
//! Each step only runs from the state shown above it; calling one out of
//! order fails with `InvalidTransition` and leaves both the claim and the
//! ledger untouched.

use crate::access::{AccessGate, MutationGrant};
use crate::authorization::{verify, AuthorizationMessage, SignatureBytes};
use crate::errors::{RegistryError, RegistryResult};
use crate::events::{EventLog, RegistryEvent};
use crate::ledger::{scope_key, RewardLedger};
use crate::mint::MintHandoff;
use crate::replay::{check_freshness, expiry_cutoff, ConsumedAuthorizations};
use serde::{Deserialize, Serialize};
use unclaimed_core::{Address, Amount, Hash32, ScopeKey, SelfClaimPolicy, UnixSeconds};

/// Scope every self-claim is drawn from. Rewards meant to be self-claimable
/// are registered under this label.
pub const SELF_CLAIM_SCOPE: &str = "self-claim";

/// Scoped key a self-claim with relying party `param` debits
pub fn self_claim_key(param: Address) -> RegistryResult<ScopeKey> {
    scope_key(SELF_CLAIM_SCOPE, param)
}

/// End-user self-claim payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfClaimRequest {
    /// Account receiving the claim
    pub to: Address,
    /// Amount to claim
    pub amount: Amount,
    /// Relying party the claim is drawn against
    pub param: Address,
    /// Time the authority issued the signature
    pub timestamp: UnixSeconds,
    /// Identity the signature is claimed to come from
    pub signer: Address,
    /// Detached signature over the message hash
    pub signature: SignatureBytes,
}

impl SelfClaimRequest {
    /// Message this request's signature must cover when presented to the
    /// registry instance `from`
    pub fn message(&self, from: Address) -> AuthorizationMessage {
        AuthorizationMessage {
            from,
            to: self.to,
            amount: self.amount,
            param: self.param,
            timestamp: self.timestamp,
        }
    }
}

/// Self-claim progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelfClaimState {
    /// Request accepted for processing
    Received,
    /// Signature, signer identity and policy checks passed
    Verified,
    /// Local ledger debited
    Debited,
    /// Mint handoff credited
    Credited,
    /// Claim notification emitted
    Complete,
    /// Terminal failure; carries the reason code
    Rejected(&'static str),
}

impl SelfClaimState {
    /// Lowercase state name
    pub fn name(&self) -> &'static str {
        match self {
            SelfClaimState::Received => "received",
            SelfClaimState::Verified => "verified",
            SelfClaimState::Debited => "debited",
            SelfClaimState::Credited => "credited",
            SelfClaimState::Complete => "complete",
            SelfClaimState::Rejected(_) => "rejected",
        }
    }
}

/// Outcome of a completed self-claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfClaimReceipt {
    /// Account credited
    pub to: Address,
    /// Amount moved
    pub amount: Amount,
    /// Scoped key debited
    pub key: ScopeKey,
    /// Hash of the authorization that was consumed
    pub message_hash: Hash32,
    /// States traversed, in order
    pub trace: Vec<SelfClaimState>,
}

/// One self-claim in flight
#[derive(Debug)]
pub struct SelfClaim {
    request: SelfClaimRequest,
    message_hash: Hash32,
    message: AuthorizationMessage,
    key: ScopeKey,
    trace: Vec<SelfClaimState>,
    checked_at: Option<UnixSeconds>,
    recorded_consumed: bool,
}

impl SelfClaim {
    /// Enter `Received`. `instance` is the registry's own identity, which
    /// binds the authorization to this registry.
    pub fn receive(instance: Address, request: SelfClaimRequest) -> RegistryResult<Self> {
        let key = self_claim_key(request.param)?;
        let message = request.message(instance);
        Ok(Self {
            message_hash: message.hash(),
            message,
            key,
            request,
            trace: vec![SelfClaimState::Received],
            checked_at: None,
            recorded_consumed: false,
        })
    }

    /// Current state
    pub fn state(&self) -> SelfClaimState {
        self.trace
            .last()
            .copied()
            .unwrap_or(SelfClaimState::Received)
    }

    /// States traversed so far
    pub fn trace(&self) -> &[SelfClaimState] {
        &self.trace
    }

    /// Hash of the authorization message
    pub fn message_hash(&self) -> &Hash32 {
        &self.message_hash
    }

    fn advance(&mut self, next: SelfClaimState) {
        tracing::debug!(
            from = ?self.state(),
            to = ?next,
            claim = %self.message_hash,
            "self-claim transition"
        );
        self.trace.push(next);
    }

    fn require(&self, expected: SelfClaimState, next: SelfClaimState) -> RegistryResult<()> {
        let current = self.state();
        if current == expected {
            return Ok(());
        }
        tracing::warn!(
            from = current.name(),
            to = next.name(),
            claim = %self.message_hash,
            "out-of-order self-claim step"
        );
        Err(RegistryError::InvalidTransition {
            from: current.name().to_string(),
            to: next.name().to_string(),
        })
    }

    fn reject(&mut self, err: RegistryError) -> RegistryError {
        tracing::warn!(
            to = %self.request.to,
            amount = self.request.amount,
            reason = err.code(),
            "self-claim rejected"
        );
        self.advance(SelfClaimState::Rejected(err.code()));
        err
    }

    /// `Received -> Verified`
    ///
    /// The signature must verify under the claimed signer, the claimed
    /// signer must be the authorized signer, and the policy checks must pass.
    pub fn verify(
        &mut self,
        gate: &AccessGate,
        policy: &SelfClaimPolicy,
        now: Option<UnixSeconds>,
        consumed: &ConsumedAuthorizations,
    ) -> RegistryResult<MutationGrant> {
        self.require(SelfClaimState::Received, SelfClaimState::Verified)?;

        if !verify(&self.message, &self.request.signer, &self.request.signature) {
            return Err(self.reject(RegistryError::InvalidSigner));
        }
        let grant = match gate.authorize_signed(&self.request.signer) {
            Ok(grant) => grant,
            Err(err) => return Err(self.reject(err)),
        };
        if let Err(err) = check_freshness(policy, self.request.timestamp, now) {
            return Err(self.reject(err));
        }
        if policy.reject_replayed {
            if let Err(err) = consumed.check(&self.message_hash) {
                return Err(self.reject(err));
            }
        }

        self.checked_at = now;
        self.advance(SelfClaimState::Verified);
        Ok(grant)
    }

    /// `Verified -> Debited`
    ///
    /// Debits through the same ledger path as an ordinary claim.
    pub fn debit(
        &mut self,
        grant: &MutationGrant,
        ledger: &mut RewardLedger,
        policy: &SelfClaimPolicy,
        consumed: &mut ConsumedAuthorizations,
    ) -> RegistryResult<()> {
        self.require(SelfClaimState::Verified, SelfClaimState::Debited)?;

        if let Err(err) =
            ledger.register_claim(grant, &self.request.to, self.request.amount, &self.key)
        {
            return Err(self.reject(err));
        }
        if policy.reject_replayed {
            if let Some(cutoff) = expiry_cutoff(policy, self.checked_at) {
                consumed.prune_before(cutoff);
            }
            self.recorded_consumed = consumed.insert(self.message_hash, self.request.timestamp);
        }
        self.advance(SelfClaimState::Debited);
        Ok(())
    }

    /// `Debited -> Credited`
    ///
    /// Must run with no registry lock held so a re-entrant call from the
    /// mint target observes the debited balance.
    pub fn credit(&mut self, minter: &Address, mint: &dyn MintHandoff) -> RegistryResult<()> {
        self.require(SelfClaimState::Debited, SelfClaimState::Credited)?;

        mint.credit(minter, &self.request.to, self.request.amount)
            .map_err(RegistryError::MintFailed)?;
        self.advance(SelfClaimState::Credited);
        Ok(())
    }

    /// Undo the local effects of `Debited` after a failed handoff
    ///
    /// Returns `err` once the debit is reverted. From any state other than
    /// `Debited` nothing is reverted and `InvalidTransition` is returned
    /// instead.
    pub fn rollback(
        &mut self,
        ledger: &mut RewardLedger,
        consumed: &mut ConsumedAuthorizations,
        err: RegistryError,
    ) -> RegistryError {
        if let Err(invalid) =
            self.require(SelfClaimState::Debited, SelfClaimState::Rejected(err.code()))
        {
            return invalid;
        }

        ledger.revert_claim(&self.request.to, self.request.amount, &self.key);
        if self.recorded_consumed {
            consumed.remove(&self.message_hash);
            self.recorded_consumed = false;
        }
        tracing::warn!(
            to = %self.request.to,
            amount = self.request.amount,
            error = %err,
            "mint handoff failed; self-claim debit reverted"
        );
        self.advance(SelfClaimState::Rejected(err.code()));
        err
    }

    /// `Credited -> Complete`: emit the claim notification
    pub fn complete(mut self, events: &mut EventLog) -> RegistryResult<SelfClaimReceipt> {
        self.require(SelfClaimState::Credited, SelfClaimState::Complete)?;

        events.emit(RegistryEvent::ClaimRegistered {
            account: self.request.to,
            amount: self.request.amount,
            scope: self.key.scope.clone(),
            relying_party: self.key.relying_party,
        });
        self.advance(SelfClaimState::Complete);
        Ok(SelfClaimReceipt {
            to: self.request.to,
            amount: self.request.amount,
            key: self.key,
            message_hash: self.message_hash,
            trace: self.trace,
        })
    }
}
