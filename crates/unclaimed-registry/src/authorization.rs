//! Detached-signature authorization for self-claims
//!
//! The signed message is a fixed-width encoding of five fields, hashed with
//! SHA-256. Signer identities are Ed25519 verifying keys, so "recovering"
//! the signer reduces to strict verification under the claimed signer's key.
//!
//! Preimage layout (144 bytes, big-endian integers):
//!
//! | offset | width | field       |
//! |--------|-------|-------------|
//! | 0      | 24    | domain tag  |
//! | 24     | 32    | from        |
//! | 56     | 32    | to          |
//! | 88     | 16    | amount      |
//! | 104    | 32    | param       |
//! | 136    | 8     | timestamp   |

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use unclaimed_core::{Address, Amount, CoreError, CoreResult, Hash32, UnixSeconds};

/// Domain separation tag; binds the self-claim scope into every message
pub const SELF_CLAIM_DOMAIN: &[u8; 24] = b"unclaimed/self-claim/v1\0";

/// Length of the encoded preimage
pub const MESSAGE_LEN: usize = 24 + 32 + 32 + 16 + 32 + 8;

/// The tuple a self-claim signature covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationMessage {
    /// Registry instance the authorization is bound to
    pub from: Address,
    /// Account that receives the claim
    pub to: Address,
    /// Claimed amount
    pub amount: Amount,
    /// Relying party the self-claim debits
    pub param: Address,
    /// Issue time, seconds since the Unix epoch
    pub timestamp: UnixSeconds,
}

impl AuthorizationMessage {
    /// Fixed-width preimage
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let amount = self.amount.to_be_bytes();
        let timestamp = self.timestamp.to_be_bytes();
        let fields: [&[u8]; 6] = [
            SELF_CLAIM_DOMAIN,
            self.from.as_bytes(),
            self.to.as_bytes(),
            &amount,
            self.param.as_bytes(),
            &timestamp,
        ];

        let mut out = [0u8; MESSAGE_LEN];
        let mut at = 0;
        for field in fields {
            out[at..at + field.len()].copy_from_slice(field);
            at += field.len();
        }
        out
    }

    /// Digest the signature is made over
    pub fn hash(&self) -> Hash32 {
        Hash32::digest(&self.encode())
    }

    /// Sign with the authority's key
    pub fn sign(&self, key: &SigningKey) -> SignatureBytes {
        SignatureBytes(key.sign(self.hash().as_bytes()).to_bytes())
    }
}

/// Digest of `(from, to, amount, param, timestamp)`
pub fn message_hash(
    from: &Address,
    to: &Address,
    amount: Amount,
    param: &Address,
    timestamp: UnixSeconds,
) -> Hash32 {
    AuthorizationMessage {
        from: *from,
        to: *to,
        amount,
        param: *param,
        timestamp,
    }
    .hash()
}

/// Whether `signature` over the message was produced by `claimed_signer`
///
/// Pure: does not check that `claimed_signer` is the registry's authorized
/// signer. Malformed keys and non-canonical signatures verify as false.
pub fn verify(
    message: &AuthorizationMessage,
    claimed_signer: &Address,
    signature: &SignatureBytes,
) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(claimed_signer.as_bytes()) else {
        tracing::debug!(signer = %claimed_signer, "claimed signer is not a valid key");
        return false;
    };
    let signature = Signature::from_bytes(&signature.0);
    key.verify_strict(message.hash().as_bytes(), &signature).is_ok()
}

/// Address of an Ed25519 signer
pub fn signer_address(key: &VerifyingKey) -> Address {
    Address::new(key.to_bytes())
}

/// Detached 64-byte Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; 64]);

impl SignatureBytes {
    /// Get the raw bytes
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Parse from a byte slice of exactly 64 bytes
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        let array: [u8; 64] = bytes.try_into().map_err(|_| {
            CoreError::crypto(format!("signature is {} bytes, expected 64", bytes.len()))
        })?;
        Ok(Self(array))
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes({}..)", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 64]> for SignatureBytes {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SignatureBytes::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
