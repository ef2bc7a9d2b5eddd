//! Configuration management
//!
//! One immutable configuration structure, seeded with defaults and
//! overridden from the environment (prefix `TRUNKLINK`, `__` between
//! nesting levels, e.g. `TRUNKLINK_TRUNK__PROVIDER_HOST`). Components
//! receive the pieces they need at construction.

use crate::domain::notification::{RecipientDirectory, MANAGER_TAG};
use crate::domain::shared::DomainError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub trunk: TrunkConfig,
    pub agent: AgentConfig,
    pub messenger: MessengerConfig,
}

/// HTTP listener for the webhook and health endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream SIP trunk: credentials, provider address, local binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkConfig {
    pub username: String,
    pub password: String,
    pub realm: String,
    /// Network address of the trunk provider; the only source inbound
    /// calls are accepted from
    pub provider_host: String,
    pub provider_port: u16,
    pub bind_address: String,
    pub bind_port: u16,
    /// Host advertised in the Contact header; falls back to the bind address
    pub contact_host: Option<String>,
    /// Expiry requested in REGISTER, seconds
    pub register_expiry: u32,
    /// Fixed delay between registration retries, seconds
    pub retry_interval_secs: u64,
}

impl TrunkConfig {
    pub fn trusted_address(&self) -> Result<IpAddr, DomainError> {
        self.provider_host.parse().map_err(|_| {
            DomainError::Configuration(format!(
                "trunk provider host is not an IP address: {}",
                self.provider_host
            ))
        })
    }

    pub fn contact_host(&self) -> &str {
        self.contact_host.as_deref().unwrap_or(&self.bind_address)
    }
}

/// AI voice-agent platform: admission API and SIP ingress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub api_base: String,
    pub api_key: String,
    pub agent_id: String,
    /// Number presented to the platform as the called party
    pub destination_number: String,
    /// SIP domain the bridged leg is sent to, as sip:{call_id}@{sip_domain}
    pub sip_domain: String,
}

/// Messenger delivery API and the recipient directory entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    pub api_base: String,
    pub api_version: String,
    pub page_id: String,
    pub access_token: String,
    pub manager_id: String,
    pub reception_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            trunk: TrunkConfig {
                username: String::new(),
                password: String::new(),
                realm: String::new(),
                provider_host: String::new(),
                provider_port: 5060,
                bind_address: "0.0.0.0".to_string(),
                bind_port: 5060,
                contact_host: None,
                register_expiry: 3600,
                retry_interval_secs: 30,
            },
            agent: AgentConfig {
                api_base: "https://api.retellai.com".to_string(),
                api_key: String::new(),
                agent_id: String::new(),
                destination_number: String::new(),
                sip_domain: "sip.retellai.com".to_string(),
            },
            messenger: MessengerConfig {
                api_base: "https://graph.facebook.com".to_string(),
                api_version: "v21.0".to_string(),
                page_id: String::new(),
                access_token: String::new(),
                manager_id: String::new(),
                reception_id: String::new(),
            },
        }
    }
}

impl Config {
    /// Load configuration: defaults overridden by the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::Environment::with_prefix("TRUNKLINK").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Build the recipient directory from the configured messenger ids
    pub fn recipient_directory(&self) -> RecipientDirectory {
        let mut directory = RecipientDirectory::new();
        directory.insert(MANAGER_TAG, "Event Manager", self.messenger.manager_id.clone());
        directory.insert("recepcja", "Recepcja", self.messenger.reception_id.clone());
        directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.trunk.register_expiry, 3600);
        assert_eq!(config.trunk.retry_interval_secs, 30);
        assert_eq!(config.trunk.provider_port, 5060);
    }

    #[test]
    fn test_trusted_address_requires_ip() {
        let mut config = Config::default();
        config.trunk.provider_host = "198.51.100.10".to_string();
        assert!(config.trunk.trusted_address().is_ok());

        config.trunk.provider_host = "sip.provider.example".to_string();
        assert!(config.trunk.trusted_address().is_err());
    }

    #[test]
    fn test_recipient_directory_contains_both_tags() {
        let mut config = Config::default();
        config.messenger.manager_id = "1001".to_string();
        config.messenger.reception_id = "1002".to_string();

        let directory = config.recipient_directory();
        assert_eq!(directory.resolve("event_manager").unwrap().id, "1001");
        assert_eq!(directory.resolve("recepcja").unwrap().id, "1002");
        assert!(directory.resolve("kuchnia").is_none());
    }

    #[test]
    fn test_contact_host_falls_back_to_bind_address() {
        let mut config = Config::default();
        config.trunk.bind_address = "10.0.0.5".to_string();
        assert_eq!(config.trunk.contact_host(), "10.0.0.5");

        config.trunk.contact_host = Some("sbc.example.com".to_string());
        assert_eq!(config.trunk.contact_host(), "sbc.example.com");
    }
}
