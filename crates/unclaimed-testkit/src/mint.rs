//! In-memory mint-handoff target
//!
//! Keeps its own minter registry and balances, can be told to fail, and can
//! run a hook after each credit. The hook runs with no internal lock held,
//! so it may call back into the registry or into this mint.

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use unclaimed_core::{Address, Amount};
use unclaimed_registry::{MintError, MintHandoff};

type CreditHook = Arc<dyn Fn(&Address, Amount) + Send + Sync>;

/// Mint target backed by a map
#[derive(Default)]
pub struct InMemoryMint {
    minters: RwLock<BTreeSet<Address>>,
    balances: Mutex<BTreeMap<Address, Amount>>,
    fail_with: Mutex<Option<MintError>>,
    on_credit: RwLock<Option<CreditHook>>,
}

impl std::fmt::Debug for InMemoryMint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMint")
            .field("minters", &*self.minters.read())
            .field("balances", &*self.balances.lock())
            .finish_non_exhaustive()
    }
}

impl InMemoryMint {
    /// Mint with no authorized minters
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint that accepts credits from `minter`
    pub fn with_minter(minter: Address) -> Self {
        let mint = Self::new();
        mint.authorize_minter(minter);
        mint
    }

    /// Allow `minter` to credit
    pub fn authorize_minter(&self, minter: Address) {
        self.minters.write().insert(minter);
    }

    /// Stop accepting credits from `minter`
    pub fn revoke_minter(&self, minter: &Address) {
        self.minters.write().remove(minter);
    }

    /// Fail every credit with `err` until cleared
    pub fn fail_with(&self, err: MintError) {
        *self.fail_with.lock() = Some(err);
    }

    /// Stop injecting failures
    pub fn clear_failure(&self) {
        *self.fail_with.lock() = None;
    }

    /// Run `hook` after every successful credit
    pub fn on_credit<F>(&self, hook: F)
    where
        F: Fn(&Address, Amount) + Send + Sync + 'static,
    {
        *self.on_credit.write() = Some(Arc::new(hook));
    }

    /// Minted balance of `account`
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.lock().get(account).copied().unwrap_or(0)
    }

    /// Sum of all minted balances
    pub fn total_supply(&self) -> Amount {
        self.balances.lock().values().sum()
    }
}

impl MintHandoff for InMemoryMint {
    fn credit(&self, minter: &Address, account: &Address, amount: Amount) -> Result<(), MintError> {
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        if !self.minters.read().contains(minter) {
            return Err(MintError::UnauthorizedMinter);
        }
        {
            let mut balances = self.balances.lock();
            let balance = balances.entry(*account).or_insert(0);
            *balance = balance.checked_add(amount).ok_or(MintError::Overflow)?;
        }

        let hook = self.on_credit.read().clone();
        if let Some(hook) = hook {
            hook(account, amount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: Address = Address([0x10; 32]);
    const ALICE: Address = Address([0xa1; 32]);

    #[test]
    fn test_unauthorized_minter_is_refused() {
        let mint = InMemoryMint::new();
        assert_eq!(
            mint.credit(&REGISTRY, &ALICE, 5),
            Err(MintError::UnauthorizedMinter)
        );
        assert_eq!(mint.balance_of(&ALICE), 0);
    }

    #[test]
    fn test_credit_and_hook() {
        let mint = InMemoryMint::with_minter(REGISTRY);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        mint.on_credit(move |account, amount| sink.lock().push((*account, amount)));

        mint.credit(&REGISTRY, &ALICE, 5).unwrap();
        mint.credit(&REGISTRY, &ALICE, 7).unwrap();
        assert_eq!(mint.balance_of(&ALICE), 12);
        assert_eq!(mint.total_supply(), 12);
        assert_eq!(*seen.lock(), vec![(ALICE, 5), (ALICE, 7)]);
    }

    #[test]
    fn test_injected_failure() {
        let mint = InMemoryMint::with_minter(REGISTRY);
        mint.fail_with(MintError::Rejected {
            reason: "paused".into(),
        });
        assert!(mint.credit(&REGISTRY, &ALICE, 1).is_err());
        mint.clear_failure();
        assert!(mint.credit(&REGISTRY, &ALICE, 1).is_ok());
    }
}
