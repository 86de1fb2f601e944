//! Registry configuration
//!
//! Configuration is loaded from TOML, optionally overridden from
//! `UNCLAIMED_*` environment variables, then validated as a whole. Validation
//! accumulates every field problem before failing so an operator sees the
//! complete list in one pass.

use crate::errors::{CoreError, CoreResult};
use crate::identifiers::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "UNCLAIMED_";

/// Freshness and replay rules applied to self-claims
///
/// Every rule is off by default; with the defaults the only thing that stops
/// a replayed authorization is the drained scoped balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelfClaimPolicy {
    /// Reject authorizations whose timestamp is older than this many seconds
    pub max_age_secs: Option<u64>,
    /// Tolerated clock skew for timestamps ahead of the local clock.
    /// Only meaningful together with `max_age_secs`.
    pub max_future_skew_secs: u64,
    /// Record completed authorizations and reject exact repeats
    pub reject_replayed: bool,
}

impl SelfClaimPolicy {
    /// Whether the policy needs a clock reading
    pub fn has_window(&self) -> bool {
        self.max_age_secs.is_some()
    }
}

/// Top-level registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Identity of this registry instance; bound into every self-claim message
    pub instance: Address,
    /// Governance owner, fixed at creation
    pub owner: Address,
    /// Initial authorized signer
    #[serde(default)]
    pub authorized_signer: Option<Address>,
    /// Initial set of authorized callers
    #[serde(default)]
    pub authorized_callers: Vec<Address>,
    /// Self-claim freshness and replay rules
    #[serde(default)]
    pub self_claim: SelfClaimPolicy,
}

impl RegistryConfig {
    /// Minimal configuration with no signer, no callers and the default policy
    pub fn new(instance: Address, owner: Address) -> Self {
        Self {
            instance,
            owner,
            authorized_signer: None,
            authorized_callers: Vec::new(),
            self_claim: SelfClaimPolicy::default(),
        }
    }

    /// Parse from a TOML document
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded registry config");
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> CoreResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(key, value)` pairs; keys without the
    /// `UNCLAIMED_` prefix are ignored
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "INSTANCE" => self.instance = value.parse()?,
                "OWNER" => self.owner = value.parse()?,
                "AUTHORIZED_SIGNER" => {
                    self.authorized_signer = if value.is_empty() {
                        None
                    } else {
                        Some(value.parse()?)
                    };
                }
                "AUTHORIZED_CALLERS" => {
                    self.authorized_callers = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::parse)
                        .collect::<CoreResult<Vec<_>>>()?;
                }
                "SELF_CLAIM_MAX_AGE_SECS" => {
                    self.self_claim.max_age_secs = if value.is_empty() {
                        None
                    } else {
                        Some(parse_number(name, value)?)
                    };
                }
                "SELF_CLAIM_MAX_FUTURE_SKEW_SECS" => {
                    self.self_claim.max_future_skew_secs = parse_number(name, value)?;
                }
                "SELF_CLAIM_REJECT_REPLAYED" => {
                    self.self_claim.reject_replayed = parse_bool(name, value)?;
                }
                other => {
                    tracing::warn!(key = %other, "ignoring unknown {ENV_PREFIX} override");
                }
            }
        }
        Ok(())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> CoreResult<()> {
        let mut validator = ConfigValidator::new();
        validator
            .non_zero("instance", &self.instance)
            .non_zero("owner", &self.owner);
        if let Some(signer) = &self.authorized_signer {
            validator.non_zero("authorized_signer", signer);
        }
        for (i, caller) in self.authorized_callers.iter().enumerate() {
            validator.non_zero(&format!("authorized_callers[{i}]"), caller);
        }
        if self.self_claim.max_future_skew_secs > 0 && self.self_claim.max_age_secs.is_none() {
            validator.custom(
                "self_claim.max_future_skew_secs",
                "has no effect without self_claim.max_age_secs",
            );
        }
        validator.finish()
    }
}

fn parse_number(field: &str, value: &str) -> CoreResult<u64> {
    value
        .parse()
        .map_err(|e| CoreError::config(format!("{ENV_PREFIX}{field}: {e}")))
}

fn parse_bool(field: &str, value: &str) -> CoreResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::config(format!(
            "{ENV_PREFIX}{field}: expected a boolean, got {value:?}"
        ))),
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identity field holds the all-zero address
    ZeroAddress {
        /// Offending field
        field: String,
    },
    /// Custom validation failed
    Custom {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroAddress { field } => {
                write!(f, "Field '{field}' must not be the zero address")
            }
            ValidationError::Custom { field, message } => write!(f, "Field '{field}': {message}"),
        }
    }
}

/// Validator that accumulates rule violations
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
}

impl ConfigValidator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a real identity
    pub fn non_zero(&mut self, field: &str, value: &Address) -> &mut Self {
        if value.is_zero() {
            self.errors.push(ValidationError::ZeroAddress {
                field: field.to_string(),
            });
        }
        self
    }

    /// Record a custom rule violation
    pub fn custom(&mut self, field: &str, message: &str) -> &mut Self {
        self.errors.push(ValidationError::Custom {
            field: field.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Errors gathered so far
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Fail with every accumulated error, or succeed if there are none
    pub fn finish(&self) -> CoreResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(CoreError::config(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn test_minimal_config_validates() {
        RegistryConfig::new(addr(1), addr(2)).validate().unwrap();
    }

    #[test]
    fn test_validation_accumulates() {
        let mut config = RegistryConfig::new(Address::ZERO, Address::ZERO);
        config.authorized_callers = vec![addr(3), Address::ZERO];
        config.self_claim.max_future_skew_secs = 10;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'instance'"));
        assert!(err.contains("'owner'"));
        assert!(err.contains("authorized_callers[1]"));
        assert!(err.contains("max_future_skew_secs"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegistryConfig::new(addr(1), addr(2));
        let signer = addr(9);
        config
            .merge_with_vars([
                ("UNCLAIMED_AUTHORIZED_SIGNER", signer.to_string()),
                (
                    "UNCLAIMED_AUTHORIZED_CALLERS",
                    format!("{}, {}", addr(4), addr(5)),
                ),
                ("UNCLAIMED_SELF_CLAIM_MAX_AGE_SECS", "600".to_string()),
                ("UNCLAIMED_SELF_CLAIM_REJECT_REPLAYED", "yes".to_string()),
                ("PATH", "/usr/bin".to_string()),
            ])
            .unwrap();

        assert_eq!(config.authorized_signer, Some(signer));
        assert_eq!(config.authorized_callers, vec![addr(4), addr(5)]);
        assert_eq!(config.self_claim.max_age_secs, Some(600));
        assert!(config.self_claim.reject_replayed);
    }

    #[test]
    fn test_env_override_rejects_bad_values() {
        let mut config = RegistryConfig::new(addr(1), addr(2));
        assert!(config
            .merge_with_vars([("UNCLAIMED_SELF_CLAIM_REJECT_REPLAYED", "maybe")])
            .is_err());
        assert!(config
            .merge_with_vars([("UNCLAIMED_OWNER", "0x1234")])
            .is_err());
    }
}
