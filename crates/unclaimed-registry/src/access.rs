//! Access gate: governance owner, authorized signer and authorized callers
//!
//! The gate is pure state plus checks. Every mutation authorization is
//! reported as a [`MutationAuthority`] so the decision path (direct signer or
//! delegated caller) is explicit and testable on its own, and is handed to
//! the ledger as a [`MutationGrant`] that only this crate can mint.

use crate::errors::{RegistryError, RegistryResult};
use crate::events::RegistryEvent;
use std::collections::BTreeSet;
use unclaimed_core::Address;

/// How a ledger mutation was authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAuthority {
    /// The caller is the authorized signer itself
    DirectSigner {
        /// The signer
        signer: Address,
    },
    /// An authorized caller acting on behalf of the signer it declared
    DelegatedCaller {
        /// The intermediary making the call
        caller: Address,
        /// Signer the intermediary declared; equal to the authorized signer
        declared_signer: Address,
    },
    /// A self-claim whose signature verified under the authorized signer
    SignedAuthorization {
        /// The signer whose signature was checked
        signer: Address,
    },
}

impl MutationAuthority {
    /// Signer whose endorsement the mutation carries
    pub fn signer(&self) -> &Address {
        match self {
            MutationAuthority::DirectSigner { signer }
            | MutationAuthority::SignedAuthorization { signer } => signer,
            MutationAuthority::DelegatedCaller {
                declared_signer, ..
            } => declared_signer,
        }
    }
}

/// Proof that the access gate approved a ledger mutation
///
/// Cannot be constructed outside this crate, so the ledger's mutating
/// methods are unreachable without passing through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationGrant {
    authority: MutationAuthority,
}

impl MutationGrant {
    pub(crate) fn new(authority: MutationAuthority) -> Self {
        Self { authority }
    }

    /// How the mutation was authorized
    pub fn authority(&self) -> &MutationAuthority {
        &self.authority
    }
}

/// Governance state
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Address,
    authorized_signer: Option<Address>,
    authorized_callers: BTreeSet<Address>,
}

impl AccessGate {
    /// Create a gate owned by `owner` with no signer and no callers
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            authorized_signer: None,
            authorized_callers: BTreeSet::new(),
        }
    }

    /// Current owner
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Current authorized signer, if one has been set
    pub fn authorized_signer(&self) -> Option<&Address> {
        self.authorized_signer.as_ref()
    }

    /// Authorized callers in address order
    pub fn authorized_callers(&self) -> impl Iterator<Item = &Address> {
        self.authorized_callers.iter()
    }

    /// Whether `caller` is the owner
    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Whether `id` is the current authorized signer
    pub fn is_authorized_signer(&self, id: &Address) -> bool {
        self.authorized_signer.as_ref() == Some(id)
    }

    /// Whether `id` is in the authorized caller set
    pub fn is_authorized_caller(&self, id: &Address) -> bool {
        self.authorized_callers.contains(id)
    }

    fn require_owner(&self, caller: &Address) -> RegistryResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "governance call from non-owner");
            Err(RegistryError::NotOwner)
        }
    }

    /// Hand ownership to `new_owner`
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> RegistryResult<RegistryEvent> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::InvalidAddress {
                field: "owner".into(),
            });
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        Ok(RegistryEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        })
    }

    /// Replace the authorized signer
    pub fn change_authorized_signer(
        &mut self,
        caller: &Address,
        new_signer: Address,
    ) -> RegistryResult<RegistryEvent> {
        self.require_owner(caller)?;
        self.authorized_signer = Some(new_signer);
        Ok(RegistryEvent::AuthorizedSignerChanged { signer: new_signer })
    }

    /// Add an authorized caller. Adding an existing caller still succeeds
    /// and still notifies.
    pub fn add_authorized_caller(
        &mut self,
        caller: &Address,
        id: Address,
    ) -> RegistryResult<RegistryEvent> {
        self.require_owner(caller)?;
        self.authorized_callers.insert(id);
        Ok(RegistryEvent::AuthorizedCallerAdded { caller: id })
    }

    /// Remove an authorized caller. Returns `None` when `id` was not present.
    pub fn remove_authorized_caller(
        &mut self,
        caller: &Address,
        id: &Address,
    ) -> RegistryResult<Option<RegistryEvent>> {
        self.require_owner(caller)?;
        Ok(self
            .authorized_callers
            .remove(id)
            .then_some(RegistryEvent::AuthorizedCallerRemoved { caller: *id }))
    }

    /// Decide whether `tx_caller` may mutate the ledger
    ///
    /// Succeeds when the caller is the authorized signer, or when the caller
    /// is an authorized caller and `declared_signer` is the authorized signer.
    pub fn authorize_mutation(
        &self,
        tx_caller: &Address,
        declared_signer: &Address,
    ) -> RegistryResult<MutationGrant> {
        let Some(signer) = self.authorized_signer else {
            tracing::debug!(caller = %tx_caller, "mutation refused: no authorized signer set");
            return Err(RegistryError::NotAuthorized);
        };

        let authority = if *tx_caller == signer {
            MutationAuthority::DirectSigner { signer }
        } else if self.is_authorized_caller(tx_caller) && *declared_signer == signer {
            MutationAuthority::DelegatedCaller {
                caller: *tx_caller,
                declared_signer: *declared_signer,
            }
        } else {
            tracing::debug!(
                caller = %tx_caller,
                declared = %declared_signer,
                "mutation refused"
            );
            return Err(RegistryError::NotAuthorized);
        };

        tracing::debug!(?authority, "mutation authorized");
        Ok(MutationGrant::new(authority))
    }

    /// Grant for a self-claim whose signature verified under `signer`
    ///
    /// Fails with `InvalidSigner` unless `signer` is the current authorized
    /// signer.
    pub(crate) fn authorize_signed(&self, signer: &Address) -> RegistryResult<MutationGrant> {
        if self.is_authorized_signer(signer) {
            Ok(MutationGrant::new(MutationAuthority::SignedAuthorization {
                signer: *signer,
            }))
        } else {
            Err(RegistryError::InvalidSigner)
        }
    }
}
