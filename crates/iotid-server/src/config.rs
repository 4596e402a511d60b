//! Server configuration.
//!
//! This is the only module that reads the process environment. The loaded
//! record is split into per-component settings when the state is built.

use anyhow::{bail, Context, Result};
use iotid_identity_core::{AllowlistConfig, IdentityCoreConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDriver {
    Memory,
    RocksDb,
}

impl FromStr for DatabaseDriver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(DatabaseDriver::Memory),
            "rocksdb" => Ok(DatabaseDriver::RocksDb),
            other => bail!("unsupported DATABASE_DRIVER '{}'", other),
        }
    }
}

/// Authentication required on the admin listener
#[derive(Clone, PartialEq, Eq)]
pub enum AuthProvider {
    Disabled,
    /// Shared bearer secret
    StaticClient { secret: String },
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::Disabled => f.write_str("Disabled"),
            AuthProvider::StaticClient { .. } => f.write_str("StaticClient"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_driver: DatabaseDriver,
    /// RocksDB path when `database_driver` is `RocksDb`
    pub database_path: PathBuf,

    pub mqtt_host: String,
    pub mqtt_port: u16,
    /// Directory holding `ca.crt` and `ca.key`
    pub certificates_path: PathBuf,

    /// Internal admin listener
    pub internal_address: SocketAddr,
    /// Public enrollment listener
    pub enroll_address: SocketAddr,

    pub auto_registration_enabled: bool,
    pub default_organization: String,
    pub account_key_url: String,
    pub valid_sha384_keys: Vec<String>,

    pub auth_provider: AuthProvider,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_driver = var("DATABASE_DRIVER", "memory").parse()?;
        let database_path = var("DATABASE_CONNECTION_STRING", "./data/iotid.db").into();

        let mqtt_host = var("MQTT_HOST_ADDRESS", "localhost");
        let mqtt_port = var("MQTT_HOST_PORT", "8883")
            .parse()
            .context("MQTT_HOST_PORT must be a port number")?;
        let certificates_path = var("MQTT_CERTIFICATES_PATH", "./certs").into();

        let host: IpAddr = var("SERVICE_HOST", "0.0.0.0")
            .parse()
            .context("SERVICE_HOST must be an IP address")?;
        let internal_port: u16 = var("SERVICE_PORT_INTERNAL", "8040")
            .parse()
            .context("SERVICE_PORT_INTERNAL must be a port number")?;
        let enroll_port: u16 = var("SERVICE_PORT_ENROLL", "8041")
            .parse()
            .context("SERVICE_PORT_ENROLL must be a port number")?;

        let auto_registration_enabled = parse_bool(&var("AUTO_REGISTRATION_ENABLED", "false"))
            .context("AUTO_REGISTRATION_ENABLED must be true or false")?;
        let default_organization = var("DEFAULT_ORGANIZATION", "");
        let account_key_url = var(
            "ACCOUNT_KEY_URL",
            "https://assertions.ubuntu.com/v1/assertions/account-key",
        );
        let valid_sha384_keys = var("VALID_SHA384_KEYS", "")
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();

        let auth_provider = match var("SERVICE_AUTH_PROVIDER", "disabled").to_lowercase().as_str() {
            "disabled" => AuthProvider::Disabled,
            "static-client" => {
                let secret = var("SERVICE_AUTH_STATIC_SECRET", "");
                if secret.is_empty() {
                    bail!("SERVICE_AUTH_STATIC_SECRET is required for the static-client provider");
                }
                AuthProvider::StaticClient { secret }
            }
            "keycloak" => bail!("the keycloak auth provider is not supported by this server"),
            other => bail!("unknown SERVICE_AUTH_PROVIDER '{}'", other),
        };

        Ok(Config {
            database_driver,
            database_path,
            mqtt_host,
            mqtt_port,
            certificates_path,
            internal_address: SocketAddr::new(host, internal_port),
            enroll_address: SocketAddr::new(host, enroll_port),
            auto_registration_enabled,
            default_organization,
            account_key_url,
            valid_sha384_keys,
            auth_provider,
        })
    }

    pub fn identity_core(&self) -> IdentityCoreConfig {
        IdentityCoreConfig {
            mqtt_url: self.mqtt_host.clone(),
            mqtt_port: self.mqtt_port,
            auto_registration_enabled: self.auto_registration_enabled,
            default_organization: self.default_organization.clone(),
        }
    }

    pub fn allowlist(&self) -> AllowlistConfig {
        AllowlistConfig {
            account_key_url: self.account_key_url.clone(),
            key_ids: self.valid_sha384_keys.clone(),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => bail!("invalid boolean '{}'", other),
    }
}
