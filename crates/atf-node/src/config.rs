//! # Node Configuration
//!
//! Identities of the two peers and how messages travel between them.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ATF_SENDER_ADDRESS` | `sender@gematik.kim.de` |
//! | `ATF_SENDER_DISPLAY` | `Sender` |
//! | `ATF_SENDER_ENDPOINT` | `https://sender.example.com/endpoint` |
//! | `ATF_RECEIVER_ADDRESS` | `receiver@gematik.kim.de` |
//! | `ATF_RECEIVER_DISPLAY` | `Receiver` |
//! | `ATF_RECEIVER_ENDPOINT` | `https://receiver.example.com/endpoint` |
//! | `ATF_DELIVERY_MODE` | `async` (`sync` or `async`) |

use std::str::FromStr;

use atf_bundle_processor::NodeIdentity;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("Sender and receiver share the address {0}")]
    DuplicateAddress(String),

    #[error("Unknown delivery mode '{0}', expected 'sync' or 'async'")]
    UnknownDeliveryMode(String),
}

/// How outgoing messages reach the other peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Inside `trigger`, on the publishing thread.
    Sync,
    /// Through a queue drained by a Tokio task per peer.
    #[default]
    Async,
}

impl FromStr for DeliveryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            other => Err(ConfigError::UnknownDeliveryMode(other.to_string())),
        }
    }
}

/// Identity of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub address: String,
    pub display: String,
    pub endpoint: String,
}

impl PeerConfig {
    #[must_use]
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(&self.address, &self.display, &self.endpoint)
    }

    fn from_lookup(
        prefix: &str,
        defaults: PeerConfig,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |name: &str| lookup(format!("ATF_{prefix}_{name}").as_str());
        Self {
            address: var("ADDRESS").unwrap_or(defaults.address),
            display: var("DISPLAY").unwrap_or(defaults.display),
            endpoint: var("ENDPOINT").unwrap_or(defaults.endpoint),
        }
    }

    fn validate(&self, role: &str) -> Result<(), ConfigError> {
        for (name, value) in [("address", &self.address), ("endpoint", &self.endpoint)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty {
                    field: format!("{role}.{name}"),
                });
            }
        }
        Ok(())
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub sender: PeerConfig,
    pub receiver: PeerConfig,
    pub delivery: DeliveryMode,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            sender: PeerConfig {
                address: "sender@gematik.kim.de".to_string(),
                display: "Sender".to_string(),
                endpoint: "https://sender.example.com/endpoint".to_string(),
            },
            receiver: PeerConfig {
                address: "receiver@gematik.kim.de".to_string(),
                display: "Receiver".to_string(),
                endpoint: "https://receiver.example.com/endpoint".to_string(),
            },
            delivery: DeliveryMode::default(),
        }
    }
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let delivery = match lookup("ATF_DELIVERY_MODE") {
            Some(mode) => mode.parse()?,
            None => defaults.delivery,
        };
        Ok(Self {
            sender: PeerConfig::from_lookup("SENDER", defaults.sender, &lookup),
            receiver: PeerConfig::from_lookup("RECEIVER", defaults.receiver, &lookup),
            delivery,
        })
    }

    /// Reject empty addresses or endpoints, and peers sharing an address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sender.validate("sender")?;
        self.receiver.validate("receiver")?;
        if self.sender.address == self.receiver.address {
            return Err(ConfigError::DuplicateAddress(self.sender.address.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("ATF_SENDER_ADDRESS", "praxis@kim.de"),
            ("ATF_RECEIVER_ENDPOINT", "https://pvs.example.com"),
            ("ATF_DELIVERY_MODE", "SYNC"),
        ]))
        .unwrap();
        assert_eq!(config.sender.address, "praxis@kim.de");
        assert_eq!(config.sender.display, "Sender");
        assert_eq!(config.receiver.endpoint, "https://pvs.example.com");
        assert_eq!(config.delivery, DeliveryMode::Sync);
    }

    #[test]
    fn test_unknown_delivery_mode() {
        assert_eq!(
            NodeConfig::from_lookup(lookup(&[("ATF_DELIVERY_MODE", "carrier-pigeon")])),
            Err(ConfigError::UnknownDeliveryMode("carrier-pigeon".into()))
        );
    }

    #[test]
    fn test_validate_rejects_empty_address() {
        let mut config = NodeConfig::default();
        config.receiver.address = "  ".into();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty {
                field: "receiver.address".into()
            })
        );
    }

    #[test]
    fn test_validate_rejects_shared_address() {
        let mut config = NodeConfig::default();
        config.receiver.address = config.sender.address.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAddress(_))
        ));
    }
}
