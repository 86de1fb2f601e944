//! Identity and classification types
//!
//! `Address` identifies every party the registry knows about: accounts,
//! the owner, signers, authorized callers, relying parties and the registry
//! instance itself. Signer addresses are Ed25519 verifying keys, so a
//! signer's address doubles as the key its signatures are checked against.

use crate::errors::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Token amount. Unsigned, so negative amounts are unrepresentable.
pub type Amount = u128;

/// Seconds since the Unix epoch.
pub type UnixSeconds = u64;

/// 32-byte identity
///
/// Serialized as lowercase hex; parsing accepts an optional `0x` prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address, used as the "unset" identity
    pub const ZERO: Address = Address([0u8; 32]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the unset identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Maximum scope label length in bytes
pub const MAX_SCOPE_LEN: usize = 32;

/// Short label classifying why value was earned or claimed (e.g. `"invite"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeLabel(String);

impl ScopeLabel {
    /// Validate and wrap a label
    ///
    /// Labels are 1..=32 bytes of UTF-8 with no control characters.
    pub fn new(label: impl Into<String>) -> CoreResult<Self> {
        let label = label.into();
        if label.is_empty() {
            return Err(CoreError::invalid("scope label is empty"));
        }
        if label.len() > MAX_SCOPE_LEN {
            return Err(CoreError::invalid(format!(
                "scope label is {} bytes (max {MAX_SCOPE_LEN})",
                label.len()
            )));
        }
        if label.chars().any(char::is_control) {
            return Err(CoreError::invalid("scope label contains control characters"));
        }
        Ok(Self(label))
    }

    /// Borrow the label text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ScopeLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ScopeLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ScopeLabel::new(s).map_err(serde::de::Error::custom)
    }
}

/// Scoped classification: the label plus the relying party it is tracked for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Why the value was earned
    pub scope: ScopeLabel,
    /// Third party on whose behalf the value is tracked
    pub relying_party: Address,
}

impl ScopeKey {
    /// Build a key from an already validated label
    pub fn new(scope: ScopeLabel, relying_party: Address) -> Self {
        Self {
            scope,
            relying_party,
        }
    }

    /// Validate a raw label and build a key
    pub fn parse(scope: &str, relying_party: Address) -> CoreResult<Self> {
        Ok(Self::new(ScopeLabel::new(scope)?, relying_party))
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.scope, self.relying_party.short())
    }
}

/// Serde adapter encoding an [`Amount`] as a decimal string
///
/// Use with `#[serde(with = "unclaimed_core::identifiers::amount_string")]`
/// wherever an amount sits inside an internally tagged or flattened type:
/// those deserialize through a buffer that has no 128-bit integers.
pub mod amount_string {
    use super::Amount;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal string
    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    /// Parse a decimal string
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip_accepts_prefix() {
        let addr = Address::new([0xab; 32]);
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert!(Address::from_hex("abcd").is_err());
        assert!(Address::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1; 32]).is_zero());
    }

    #[test]
    fn test_scope_label_validation() {
        assert!(ScopeLabel::new("invite").is_ok());
        assert!(ScopeLabel::new("").is_err());
        assert!(ScopeLabel::new("x".repeat(MAX_SCOPE_LEN)).is_ok());
        assert!(ScopeLabel::new("x".repeat(MAX_SCOPE_LEN + 1)).is_err());
        assert!(ScopeLabel::new("in\nvite").is_err());
    }

    #[test]
    fn test_scope_label_deserialize_validates() {
        let ok: ScopeLabel = serde_json::from_str("\"invite\"").unwrap();
        assert_eq!(ok.as_str(), "invite");
        assert!(serde_json::from_str::<ScopeLabel>("\"\"").is_err());
    }

    #[test]
    fn test_address_serde_is_prefixed_hex() {
        let addr = Address::new([0x11; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(32)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind")]
    enum Tagged {
        Credit {
            #[serde(with = "amount_string")]
            amount: Amount,
        },
    }

    #[test]
    fn test_amount_string_survives_tagged_enum() {
        let value = Tagged::Credit { amount: Amount::MAX };
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains(&format!("\"{}\"", Amount::MAX)));
        let back: Tagged = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
        assert!(serde_json::from_str::<Tagged>(r#"{"kind":"Credit","amount":"-1"}"#).is_err());
    }
}
