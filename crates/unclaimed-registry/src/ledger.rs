//! Scoped reward ledger
//!
//! Tracks earned and claimed totals per account and per
//! (account, scope, relying party). Both levels move in lock-step:
//!
//! - `claimed <= earned` holds for every entry, aggregate and scoped
//! - the scoped `earned` values of an account sum to its aggregate `earned`
//!
//! The second property is maintained by construction: every credit and debit
//! touches exactly one scoped entry and the aggregate entry by the same
//! amount. Claims are checked against the scoped balance, which can never
//! exceed the aggregate one, so a scoped claim cannot drive the aggregate
//! balance negative.

use crate::access::MutationGrant;
use crate::errors::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use unclaimed_core::{Address, Amount, ScopeKey};

/// Validate a raw scope label and build a key
pub fn scope_key(scope: &str, relying_party: Address) -> RegistryResult<ScopeKey> {
    ScopeKey::parse(scope, relying_party).map_err(|e| RegistryError::InvalidScope {
        message: e.to_string(),
    })
}

/// Earned/claimed pair for one account, either in aggregate or within a scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Cumulative credited amount
    pub earned: Amount,
    /// Cumulative debited amount
    pub claimed: Amount,
}

impl LedgerEntry {
    /// Unclaimed amount
    pub fn balance(&self) -> Amount {
        // claimed <= earned is an entry invariant
        self.earned - self.claimed
    }
}

/// Reward ledger state
#[derive(Debug, Clone, Default)]
pub struct RewardLedger {
    totals: BTreeMap<Address, LedgerEntry>,
    scoped: BTreeMap<(Address, ScopeKey), LedgerEntry>,
}

impl RewardLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account` under `key`
    ///
    /// Not idempotent: each call is an independent credit.
    pub fn register_reward(
        &mut self,
        grant: &MutationGrant,
        account: &Address,
        amount: Amount,
        key: &ScopeKey,
    ) -> RegistryResult<()> {
        let total = self.totals.get(account).copied().unwrap_or_default();
        let scoped = self.scoped_entry(account, key);

        let new_total = total.earned.checked_add(amount).ok_or(RegistryError::Overflow)?;
        // Scoped earned never exceeds aggregate earned, so this cannot fail
        // once the aggregate check passed.
        let new_scoped = scoped.earned.checked_add(amount).ok_or(RegistryError::Overflow)?;

        self.totals.entry(*account).or_default().earned = new_total;
        self.scoped
            .entry((*account, key.clone()))
            .or_default()
            .earned = new_scoped;

        tracing::debug!(
            account = %account,
            amount,
            scope = %key,
            authority = ?grant.authority(),
            "reward credited"
        );
        Ok(())
    }

    /// Debit `amount` from `account` under `key`
    ///
    /// Fails with `InsufficientBalance` when the scoped balance is short,
    /// leaving both levels untouched.
    pub fn register_claim(
        &mut self,
        grant: &MutationGrant,
        account: &Address,
        amount: Amount,
        key: &ScopeKey,
    ) -> RegistryResult<()> {
        let available = self.balance_of_by_scope(account, key);
        if amount > available {
            tracing::warn!(
                account = %account,
                requested = amount,
                available,
                scope = %key,
                "claim exceeds scoped balance"
            );
            return Err(RegistryError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        if amount == 0 {
            return Ok(());
        }

        // amount <= scoped balance <= aggregate balance, so neither claimed
        // total can pass its earned total.
        if let Some(entry) = self.scoped.get_mut(&(*account, key.clone())) {
            entry.claimed += amount;
        }
        if let Some(entry) = self.totals.get_mut(account) {
            entry.claimed += amount;
        }

        tracing::debug!(
            account = %account,
            amount,
            scope = %key,
            authority = ?grant.authority(),
            "claim debited"
        );
        Ok(())
    }

    /// Undo a debit made by `register_claim` in the same operation
    pub(crate) fn revert_claim(&mut self, account: &Address, amount: Amount, key: &ScopeKey) {
        if let Some(entry) = self.scoped.get_mut(&(*account, key.clone())) {
            entry.claimed = entry.claimed.saturating_sub(amount);
        }
        if let Some(entry) = self.totals.get_mut(account) {
            entry.claimed = entry.claimed.saturating_sub(amount);
        }
    }

    fn scoped_entry(&self, account: &Address, key: &ScopeKey) -> LedgerEntry {
        self.scoped
            .get(&(*account, key.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Aggregate entry; zero for unseen accounts
    pub fn entry(&self, account: &Address) -> LedgerEntry {
        self.totals.get(account).copied().unwrap_or_default()
    }

    /// Scoped entry; zero for unseen keys
    pub fn entry_by_scope(&self, account: &Address, key: &ScopeKey) -> LedgerEntry {
        self.scoped_entry(account, key)
    }

    /// Aggregate unclaimed balance
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.entry(account).balance()
    }

    /// Scoped unclaimed balance
    pub fn balance_of_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.scoped_entry(account, key).balance()
    }

    /// Aggregate earned total
    pub fn earned(&self, account: &Address) -> Amount {
        self.entry(account).earned
    }

    /// Scoped earned total
    pub fn earned_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.scoped_entry(account, key).earned
    }

    /// Aggregate claimed total
    pub fn claimed(&self, account: &Address) -> Amount {
        self.entry(account).claimed
    }

    /// Scoped claimed total
    pub fn claimed_by_scope(&self, account: &Address, key: &ScopeKey) -> Amount {
        self.scoped_entry(account, key).claimed
    }

    /// Scoped entries of one account
    pub fn scopes_of<'a>(
        &'a self,
        account: &'a Address,
    ) -> impl Iterator<Item = (&'a ScopeKey, &'a LedgerEntry)> + 'a {
        self.scoped
            .iter()
            .filter(move |((owner, _), _)| owner == account)
            .map(|((_, key), entry)| (key, entry))
    }

    /// Accounts that have ever been credited
    pub fn accounts(&self) -> impl Iterator<Item = &Address> {
        self.totals.keys()
    }

    /// Check both ledger invariants for `account`
    pub fn is_consistent(&self, account: &Address) -> bool {
        let total = self.entry(account);
        let mut earned_sum: Amount = 0;
        let mut claimed_sum: Amount = 0;
        for (_, entry) in self.scopes_of(account) {
            if entry.claimed > entry.earned {
                return false;
            }
            earned_sum = earned_sum.saturating_add(entry.earned);
            claimed_sum = claimed_sum.saturating_add(entry.claimed);
        }
        total.claimed <= total.earned && earned_sum == total.earned && claimed_sum == total.claimed
    }
}
