//! Key test helpers
//!
//! Deterministic Ed25519 signer identities and self-claim signing.

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use unclaimed_core::{Address, Amount, UnixSeconds};
use unclaimed_registry::{signer_address, AuthorizationMessage, SelfClaimRequest, SignatureBytes};

/// Signer fixture with a stable identity
#[derive(Debug, Clone)]
pub struct KeyFixture {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl KeyFixture {
    /// Create a key from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        let address = signer_address(&verifying_key);
        Self {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Create a key from a seed string
    pub fn from_seed_string(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let seed_bytes: [u8; 32] = digest.into();
        Self::from_seed(&seed_bytes)
    }

    /// Signing key
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Verifying key
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Registry identity of this signer
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign an authorization message
    pub fn sign(&self, message: &AuthorizationMessage) -> SignatureBytes {
        message.sign(&self.signing_key)
    }

    /// Build a self-claim request for registry `instance`, signed by this key
    pub fn self_claim(
        &self,
        instance: Address,
        to: Address,
        amount: Amount,
        param: Address,
        timestamp: UnixSeconds,
    ) -> SelfClaimRequest {
        let message = AuthorizationMessage {
            from: instance,
            to,
            amount,
            param,
            timestamp,
        };
        SelfClaimRequest {
            to,
            amount,
            param,
            timestamp,
            signer: self.address,
            signature: self.sign(&message),
        }
    }
}
