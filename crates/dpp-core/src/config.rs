//! Platform configuration from environment variables.
//!
//! Read once at startup and handed to validators and factories. Validation
//! never reads the environment itself.

use serde::{Deserialize, Serialize};
use shared_types::{Identifier, IdentifierError};
use std::env;
use thiserror::Error;

/// Protocol version used when none is configured.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 0;

/// Variable holding the protocol version stamped on new entities.
pub const PROTOCOL_VERSION_VAR: &str = "DPP_PROTOCOL_VERSION";

/// Variable holding the comma-separated identities allowed to own contracts.
pub const CONTRACT_OWNER_ALLOWLIST_VAR: &str = "DPP_CONTRACT_OWNER_ALLOWLIST";

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Protocol version is not an unsigned integer.
    #[error("Invalid DPP_PROTOCOL_VERSION `{0}`")]
    InvalidProtocolVersion(String),

    /// Allow-list entry is not an identifier.
    #[error("Invalid DPP_CONTRACT_OWNER_ALLOWLIST entry `{entry}`: {source}")]
    InvalidAllowedOwner {
        entry: String,
        source: IdentifierError,
    },
}

/// Node-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Protocol version stamped on entities built by factories.
    pub protocol_version: u32,

    /// Identities allowed to own data contracts. Empty means unrestricted.
    pub allowed_contract_owners: Vec<Identifier>,
}

impl PlatformConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DPP_PROTOCOL_VERSION`: protocol version (default: 0)
    /// - `DPP_CONTRACT_OWNER_ALLOWLIST`: comma-separated identifiers (default: unrestricted)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let protocol_version = match lookup(PROTOCOL_VERSION_VAR) {
            None => DEFAULT_PROTOCOL_VERSION,
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidProtocolVersion(raw.clone()))?,
        };

        let allowed_contract_owners = lookup(CONTRACT_OWNER_ALLOWLIST_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| {
                        Identifier::from_hex(entry).map_err(|source| {
                            ConfigError::InvalidAllowedOwner {
                                entry: entry.to_string(),
                                source,
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            protocol_version,
            allowed_contract_owners,
        })
    }

    /// Whether `owner_id` may own a data contract.
    pub fn is_owner_allowed(&self, owner_id: &Identifier) -> bool {
        self.allowed_contract_owners.is_empty() || self.allowed_contract_owners.contains(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PlatformConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, PlatformConfig::default());
        assert!(config.is_owner_allowed(&Identifier::new([1u8; 32])));
    }

    #[test]
    fn test_allowlist_restricts_owners() {
        let allowed = Identifier::new([1u8; 32]);
        let list = format!(" {} ,,", allowed.to_hex());
        let config = PlatformConfig::from_lookup(lookup(&[
            (PROTOCOL_VERSION_VAR, "3"),
            (CONTRACT_OWNER_ALLOWLIST_VAR, &list),
        ]))
        .unwrap();

        assert_eq!(config.protocol_version, 3);
        assert!(config.is_owner_allowed(&allowed));
        assert!(!config.is_owner_allowed(&Identifier::new([2u8; 32])));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            PlatformConfig::from_lookup(lookup(&[(PROTOCOL_VERSION_VAR, "x")])),
            Err(ConfigError::InvalidProtocolVersion("x".into()))
        );
        assert!(matches!(
            PlatformConfig::from_lookup(lookup(&[(CONTRACT_OWNER_ALLOWLIST_VAR, "zz")])),
            Err(ConfigError::InvalidAllowedOwner { .. })
        ));
    }
}
