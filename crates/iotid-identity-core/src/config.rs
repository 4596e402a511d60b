//! Per-component configuration records.
//!
//! Built once by the server's loader and handed to each component at
//! construction.

/// Identity Core settings
#[derive(Debug, Clone)]
pub struct IdentityCoreConfig {
    /// MQTT broker host embedded in issued credentials
    pub mqtt_url: String,
    /// MQTT broker port embedded in issued credentials
    pub mqtt_port: u16,
    /// Allow enrollment of unknown devices with allow-listed assertions
    pub auto_registration_enabled: bool,
    /// Organization that receives auto-registered devices
    pub default_organization: String,
}

impl Default for IdentityCoreConfig {
    fn default() -> Self {
        Self {
            mqtt_url: "localhost".to_string(),
            mqtt_port: 8883,
            auto_registration_enabled: false,
            default_organization: String::new(),
        }
    }
}

/// Signing-key allowlist settings
#[derive(Debug, Clone, Default)]
pub struct AllowlistConfig {
    /// Base URL serving account-key assertions, `GET <url>/<key id>`
    pub account_key_url: String,
    /// SHA-384 fingerprints of trusted signing keys
    pub key_ids: Vec<String>,
}
