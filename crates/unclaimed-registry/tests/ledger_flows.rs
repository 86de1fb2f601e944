//! Reward and claim registration through the registry root

use assert_matches::assert_matches;
use unclaimed_registry::{RegistryError, RegistryEvent};
use unclaimed_testkit::RegistryFixture;

#[test]
fn test_reward_claim_walkthrough() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    let invite = fx.key("invite");

    fx.registry.register_reward(&s, &a, 100, &invite, &s).unwrap();
    assert_eq!(fx.registry.balance_of(&a), 100);
    assert_eq!(fx.registry.balance_of_by_scope(&a, &invite), 100);

    fx.registry.register_claim(&s, &a, 50, &invite, &s).unwrap();
    assert_eq!(fx.registry.balance_of(&a), 50);
    assert_eq!(fx.registry.claimed(&a), 50);
    assert_eq!(fx.registry.claimed_by_scope(&a, &invite), 50);
    assert_eq!(fx.registry.earned(&a), 100);
}

#[test]
fn test_overdraw_fails_and_leaves_balance() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    let invite = fx.key("invite");
    fx.registry.register_reward(&s, &a, 100, &invite, &s).unwrap();
    fx.registry.drain_events();

    assert_eq!(
        fx.registry.register_claim(&s, &a, 120, &invite, &s),
        Err(RegistryError::InsufficientBalance {
            available: 100,
            requested: 120
        })
    );
    assert_eq!(fx.registry.balance_of(&a), 100);
    assert_eq!(fx.registry.claimed(&a), 0);
    assert!(fx.registry.events().is_empty());
}

#[test]
fn test_rewards_are_not_idempotent() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    fx.reward(&a, 100, "invite");
    fx.reward(&a, 100, "invite");
    assert_eq!(fx.registry.earned_by_scope(&a, &fx.key("invite")), 200);
}

#[test]
fn test_scopes_are_isolated() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    fx.reward(&a, 100, "invite");
    fx.reward(&a, 10, "streak");

    assert_eq!(fx.registry.balance_of(&a), 110);
    assert_matches!(
        fx.registry
            .register_claim(&s, &a, 11, &fx.key("streak"), &s),
        Err(RegistryError::InsufficientBalance { available: 10, .. })
    );

    let scopes = fx.registry.scopes_of(&a);
    assert_eq!(scopes.len(), 2);
    assert!(fx.registry.is_consistent(&a));
}

#[test]
fn test_reward_and_claim_emit_notifications() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    let invite = fx.key("invite");
    fx.registry.drain_events();

    fx.registry.register_reward(&s, &a, 100, &invite, &s).unwrap();
    fx.registry.register_claim(&s, &a, 40, &invite, &s).unwrap();

    assert_eq!(
        fx.registry.drain_events(),
        vec![
            RegistryEvent::RewardRegistered {
                account: a,
                amount: 100,
                scope: invite.scope.clone(),
                relying_party: fx.relying_party,
            },
            RegistryEvent::ClaimRegistered {
                account: a,
                amount: 40,
                scope: invite.scope.clone(),
                relying_party: fx.relying_party,
            },
        ]
    );
    assert!(fx.registry.events().is_empty());
}

#[test]
fn test_delegated_caller_must_declare_current_signer() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    let invite = fx.key("invite");

    fx.registry
        .register_reward(&fx.caller, &a, 30, &invite, &s)
        .unwrap();
    fx.registry
        .register_claim(&fx.caller, &a, 10, &invite, &s)
        .unwrap();
    assert_eq!(fx.registry.balance_of(&a), 20);

    let wrong = fx.account("someone-else");
    assert_eq!(
        fx.registry.register_reward(&fx.caller, &a, 30, &invite, &wrong),
        Err(RegistryError::NotAuthorized)
    );
}

#[test]
fn test_unlisted_caller_is_refused_even_declaring_signer() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    let stranger = fx.account("stranger");

    assert_eq!(
        fx.registry
            .register_reward(&stranger, &a, 1, &fx.key("invite"), &s),
        Err(RegistryError::NotAuthorized)
    );

    // Owner status confers no ledger rights.
    assert_eq!(
        fx.registry
            .register_reward(&fx.owner, &a, 1, &fx.key("invite"), &s),
        Err(RegistryError::NotAuthorized)
    );
}

#[test]
fn test_removed_caller_loses_access() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    fx.registry
        .remove_authorized_caller(&fx.owner, &fx.caller)
        .unwrap();
    assert_eq!(
        fx.registry
            .register_reward(&fx.caller, &a, 1, &fx.key("invite"), &s),
        Err(RegistryError::NotAuthorized)
    );
}

#[test]
fn test_zero_amounts_are_accepted() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    fx.registry
        .register_reward(&s, &a, 0, &fx.key("invite"), &s)
        .unwrap();
    fx.registry
        .register_claim(&s, &a, 0, &fx.key("invite"), &s)
        .unwrap();
    assert_eq!(fx.registry.balance_of(&a), 0);
    assert!(fx.registry.is_consistent(&a));
}

#[test]
fn test_overflow_is_rejected() {
    let fx = RegistryFixture::new();
    let a = fx.account("alice");
    let s = fx.signer.address();
    fx.reward(&a, u128::MAX, "invite");
    assert_eq!(
        fx.registry
            .register_reward(&s, &a, 1, &fx.key("streak"), &s),
        Err(RegistryError::Overflow)
    );
    assert_eq!(fx.registry.earned(&a), u128::MAX);
}
