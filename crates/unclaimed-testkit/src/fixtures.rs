//! Registry fixtures
//!
//! A registry wired to a manual clock and an in-memory mint, with an owner,
//! an authorized signer, one authorized caller and a default relying party.

use crate::keys::KeyFixture;
use crate::mint::InMemoryMint;
use crate::time::ManualClock;
use std::sync::Arc;
use unclaimed_core::hash::hash;
use unclaimed_core::{
    Address, Amount, PhysicalClock, RegistryConfig, ScopeKey, SelfClaimPolicy, UnixSeconds,
};
use unclaimed_registry::{scope_key, self_claim_key, SelfClaimRequest, UnclaimedRegistry};

/// Default start time of the fixture clock (2023-11-14T22:13:20Z)
pub const FIXTURE_EPOCH: UnixSeconds = 1_700_000_000;

/// Builder for [`RegistryFixture`]
#[derive(Debug, Clone)]
pub struct RegistryFixtureBuilder {
    policy: SelfClaimPolicy,
    authorize_mint: bool,
    now: UnixSeconds,
    signer_seed: String,
}

impl Default for RegistryFixtureBuilder {
    fn default() -> Self {
        Self {
            policy: SelfClaimPolicy::default(),
            authorize_mint: true,
            now: FIXTURE_EPOCH,
            signer_seed: "authorized-signer".to_string(),
        }
    }
}

impl RegistryFixtureBuilder {
    /// Self-claim policy to configure
    pub fn policy(mut self, policy: SelfClaimPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether the mint recognizes the registry as a minter
    pub fn authorize_mint(mut self, authorize: bool) -> Self {
        self.authorize_mint = authorize;
        self
    }

    /// Initial clock reading
    pub fn now(mut self, now: UnixSeconds) -> Self {
        self.now = now;
        self
    }

    /// Seed string of the authorized signer
    pub fn signer_seed(mut self, seed: &str) -> Self {
        self.signer_seed = seed.to_string();
        self
    }

    /// Wire everything up
    pub fn build(self) -> RegistryFixture {
        let owner = named("owner");
        let instance = named("registry");
        let caller = named("authorized-caller");
        let relying_party = named("relying-party");
        let signer = KeyFixture::from_seed_string(&self.signer_seed);

        let mut config = RegistryConfig::new(instance, owner);
        config.authorized_signer = Some(signer.address());
        config.authorized_callers = vec![caller];
        config.self_claim = self.policy;

        let clock = Arc::new(ManualClock::new(self.now));
        let mint = Arc::new(InMemoryMint::new());
        if self.authorize_mint {
            mint.authorize_minter(instance);
        }
        let registry = Arc::new(
            UnclaimedRegistry::with_clock(config, mint.clone(), clock.clone())
                .expect("fixture config is valid"),
        );

        RegistryFixture {
            owner,
            instance,
            caller,
            relying_party,
            signer,
            clock,
            mint,
            registry,
        }
    }
}

/// Ready-to-use registry with its collaborators
#[derive(Debug, Clone)]
pub struct RegistryFixture {
    /// Governance owner
    pub owner: Address,
    /// Registry instance identity
    pub instance: Address,
    /// Authorized caller installed at construction
    pub caller: Address,
    /// Default relying party
    pub relying_party: Address,
    /// Authorized signer
    pub signer: KeyFixture,
    /// Clock the registry reads
    pub clock: Arc<ManualClock>,
    /// Mint-handoff target
    pub mint: Arc<InMemoryMint>,
    /// Registry under test
    pub registry: Arc<UnclaimedRegistry>,
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryFixture {
    /// Fixture with default policy
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start a builder
    pub fn builder() -> RegistryFixtureBuilder {
        RegistryFixtureBuilder::default()
    }

    /// Deterministic account identity for `name`
    pub fn account(&self, name: &str) -> Address {
        named(name)
    }

    /// Key `(label, default relying party)`
    pub fn key(&self, label: &str) -> ScopeKey {
        scope_key(label, self.relying_party).expect("valid scope label")
    }

    /// Key self-claims against the default relying party debit
    pub fn self_claim_key(&self) -> ScopeKey {
        self_claim_key(self.relying_party).expect("self-claim label is valid")
    }

    /// Credit `amount` to `account` under `label` as the signer
    pub fn reward(&self, account: &Address, amount: Amount, label: &str) {
        let signer = self.signer.address();
        self.registry
            .register_reward(&signer, account, amount, &self.key(label), &signer)
            .expect("signer may register rewards");
    }

    /// Credit `amount` to `account` under the self-claim key
    pub fn fund_self_claim(&self, account: &Address, amount: Amount) {
        let signer = self.signer.address();
        self.registry
            .register_reward(&signer, account, amount, &self.self_claim_key(), &signer)
            .expect("signer may register rewards");
    }

    /// Self-claim request for `to` signed by the authorized signer at the
    /// current clock reading
    pub fn self_claim_request(&self, to: Address, amount: Amount) -> SelfClaimRequest {
        self.self_claim_request_at(to, amount, self.clock.now_secs())
    }

    /// Self-claim request with an explicit timestamp
    pub fn self_claim_request_at(
        &self,
        to: Address,
        amount: Amount,
        timestamp: UnixSeconds,
    ) -> SelfClaimRequest {
        self.signer
            .self_claim(self.instance, to, amount, self.relying_party, timestamp)
    }
}

fn named(name: &str) -> Address {
    Address::new(hash(name.as_bytes()))
}
