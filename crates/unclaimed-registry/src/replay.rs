//! Freshness window and consumed-authorization tracking for self-claims
//!
//! Both checks are opt-in through [`SelfClaimPolicy`]. With the defaults the
//! only replay protection is balance exhaustion. When a freshness window is
//! configured, consumed entries older than the window are pruned as new ones
//! are recorded; the window alone already rejects them.

use crate::errors::{RegistryError, RegistryResult};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use unclaimed_core::{Hash32, SelfClaimPolicy, UnixSeconds};

/// Check `timestamp` against the policy window
///
/// `now` is only consulted when the policy has a window; pass `None` when it
/// does not.
pub fn check_freshness(
    policy: &SelfClaimPolicy,
    timestamp: UnixSeconds,
    now: Option<UnixSeconds>,
) -> RegistryResult<()> {
    let (Some(max_age), Some(now)) = (policy.max_age_secs, now) else {
        return Ok(());
    };
    if timestamp > now.saturating_add(policy.max_future_skew_secs) {
        return Err(RegistryError::AuthorizationNotYetValid { timestamp, now });
    }
    if now.saturating_sub(timestamp) > max_age {
        return Err(RegistryError::AuthorizationExpired { timestamp, now });
    }
    Ok(())
}

/// Oldest timestamp the window still accepts at `now`
///
/// `None` when the policy has no window or `now` is unknown.
pub fn expiry_cutoff(policy: &SelfClaimPolicy, now: Option<UnixSeconds>) -> Option<UnixSeconds> {
    match (policy.max_age_secs, now) {
        (Some(max_age), Some(now)) => Some(now.saturating_sub(max_age)),
        _ => None,
    }
}

/// Message hashes of self-claims that completed their debit, with the
/// timestamp each authorization was issued at
#[derive(Debug, Clone, Default)]
pub struct ConsumedAuthorizations {
    hashes: BTreeMap<Hash32, UnixSeconds>,
}

impl ConsumedAuthorizations {
    /// Whether `hash` has been consumed
    pub fn contains(&self, hash: &Hash32) -> bool {
        self.hashes.contains_key(hash)
    }

    /// Fail with `AuthorizationReplayed` if `hash` was consumed
    pub fn check(&self, hash: &Hash32) -> RegistryResult<()> {
        if self.contains(hash) {
            Err(RegistryError::AuthorizationReplayed)
        } else {
            Ok(())
        }
    }

    /// Mark `hash`, issued at `timestamp`, consumed. Returns false if it
    /// already was.
    pub fn insert(&mut self, hash: Hash32, timestamp: UnixSeconds) -> bool {
        match self.hashes.entry(hash) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(timestamp);
                true
            }
        }
    }

    /// Forget `hash`; used when a self-claim is compensated
    pub fn remove(&mut self, hash: &Hash32) -> bool {
        self.hashes.remove(hash).is_some()
    }

    /// Drop entries issued before `cutoff`. Returns how many were dropped.
    pub fn prune_before(&mut self, cutoff: UnixSeconds) -> usize {
        let before = self.hashes.len();
        self.hashes.retain(|_, issued| *issued >= cutoff);
        let pruned = before - self.hashes.len();
        if pruned > 0 {
            tracing::debug!(pruned, cutoff, "pruned expired self-claim authorizations");
        }
        pruned
    }

    /// Number of consumed authorizations
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether nothing has been consumed
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn windowed(max_age: u64, skew: u64) -> SelfClaimPolicy {
        SelfClaimPolicy {
            max_age_secs: Some(max_age),
            max_future_skew_secs: skew,
            reject_replayed: false,
        }
    }

    #[test]
    fn test_no_window_accepts_anything() {
        let policy = SelfClaimPolicy::default();
        assert!(check_freshness(&policy, 0, None).is_ok());
        assert!(check_freshness(&policy, u64::MAX, Some(0)).is_ok());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let policy = windowed(60, 5);
        assert!(check_freshness(&policy, 1_000 - 60, Some(1_000)).is_ok());
        assert!(check_freshness(&policy, 1_000 + 5, Some(1_000)).is_ok());
        assert_matches!(
            check_freshness(&policy, 1_000 - 61, Some(1_000)),
            Err(RegistryError::AuthorizationExpired { .. })
        );
        assert_matches!(
            check_freshness(&policy, 1_000 + 6, Some(1_000)),
            Err(RegistryError::AuthorizationNotYetValid { .. })
        );
    }

    #[test]
    fn test_consumed_set() {
        let mut consumed = ConsumedAuthorizations::default();
        let h = Hash32::digest(b"claim");
        assert!(consumed.check(&h).is_ok());
        assert!(consumed.insert(h, 10));
        assert!(!consumed.insert(h, 10));
        assert_eq!(consumed.check(&h), Err(RegistryError::AuthorizationReplayed));
        assert!(consumed.remove(&h));
        assert!(consumed.is_empty());
    }

    #[test]
    fn test_prune_keeps_entries_inside_window() {
        let policy = windowed(60, 0);
        let mut consumed = ConsumedAuthorizations::default();
        consumed.insert(Hash32::digest(b"old"), 939);
        consumed.insert(Hash32::digest(b"edge"), 940);
        consumed.insert(Hash32::digest(b"new"), 1_000);

        let cutoff = expiry_cutoff(&policy, Some(1_000)).unwrap();
        assert_eq!(cutoff, 940);
        assert_eq!(consumed.prune_before(cutoff), 1);
        assert!(!consumed.contains(&Hash32::digest(b"old")));
        assert!(consumed.contains(&Hash32::digest(b"edge")));
        // The edge entry is still inside the window, so it must stay.
        assert!(check_freshness(&policy, 940, Some(1_000)).is_ok());
    }

    #[test]
    fn test_no_cutoff_without_window() {
        assert_eq!(expiry_cutoff(&SelfClaimPolicy::default(), Some(1_000)), None);
        assert_eq!(expiry_cutoff(&windowed(60, 0), None), None);
        assert_eq!(expiry_cutoff(&windowed(60, 0), Some(10)), Some(0));
    }
}
