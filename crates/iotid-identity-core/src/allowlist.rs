//! Signing-key allowlist used to gate auto-registration.
//!
//! Built once at startup by fetching the account-key assertion of every
//! configured key id. A key that cannot be fetched or decoded is logged and
//! left out; the rest of the allowlist stays usable.

use crate::{
    config::AllowlistConfig,
    errors::{IdentityCoreError, Result},
};
use iotid_crypto::{
    account_key_from_assertion, assertion_types, decode_stream, AccountPublicKey,
    ASSERTION_MEDIA_TYPE,
};
use reqwest::header::ACCEPT;
use std::collections::HashMap;
use tracing::{info, warn};

/// Immutable map of trusted signing keys, keyed by SHA-384 fingerprint
#[derive(Debug, Clone, Default)]
pub struct KeyAllowlist {
    keys: HashMap<String, AccountPublicKey>,
}

impl KeyAllowlist {
    /// Allowlist that trusts no key
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build directly from known public keys
    pub fn from_keys(keys: impl IntoIterator<Item = AccountPublicKey>) -> Self {
        Self {
            keys: keys.into_iter().map(|key| (key.key_id(), key)).collect(),
        }
    }

    /// Fetch the account-key assertion of each configured key id
    pub async fn fetch(config: &AllowlistConfig, client: &reqwest::Client) -> Self {
        let mut keys = HashMap::new();

        for key_id in &config.key_ids {
            match fetch_account_key(client, &config.account_key_url, key_id).await {
                Ok(key) => {
                    keys.insert(key_id.clone(), key);
                }
                Err(e) => {
                    warn!(key_id = %key_id, error = %e, "Skipping signing key");
                }
            }
        }

        info!(
            configured = config.key_ids.len(),
            loaded = keys.len(),
            "Signing-key allowlist ready"
        );
        Self { keys }
    }

    /// Public key for a signing-key fingerprint
    pub fn lookup(&self, key_id: &str) -> Result<&AccountPublicKey> {
        self.keys.get(key_id).ok_or_else(|| {
            IdentityCoreError::NotEligible(format!("signing key {} is not allow-listed", key_id))
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

async fn fetch_account_key(
    client: &reqwest::Client,
    base_url: &str,
    key_id: &str,
) -> std::result::Result<AccountPublicKey, String> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), key_id);

    let body = client
        .get(&url)
        .header(ACCEPT, ASSERTION_MEDIA_TYPE)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| e.to_string())?
        .bytes()
        .await
        .map_err(|e| e.to_string())?;

    let assertions = decode_stream(&body).map_err(|e| e.to_string())?;
    let assertion = assertions
        .iter()
        .find(|a| a.type_name() == assertion_types::ACCOUNT_KEY)
        .ok_or_else(|| "response contains no account-key assertion".to_string())?;

    let key = account_key_from_assertion(assertion).map_err(|e| e.to_string())?;
    if key.key_id() != key_id {
        return Err(format!("assertion publishes key {}", key.key_id()));
    }
    Ok(key)
}
