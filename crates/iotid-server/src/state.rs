use anyhow::{Context, Result};
use iotid_crypto::CertificateAuthority;
use iotid_identity_core::{
    DataStore, IdentityCoreService, KeyAllowlist, MemoryDataStore, StorageDataStore,
};
use iotid_storage::RocksDbStorage;
use std::sync::Arc;

use crate::config::{Config, DatabaseDriver};

/// Identity core over whichever store the configuration selects
pub type IdentityService = IdentityCoreService<dyn DataStore>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DataStore>,
    pub identity_service: Arc<IdentityService>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let authority = Arc::new(
            CertificateAuthority::load(&config.certificates_path)
                .context("failed to load the platform CA")?,
        );

        let store: Arc<dyn DataStore> = match config.database_driver {
            DatabaseDriver::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryDataStore::new())
            }
            DatabaseDriver::RocksDb => {
                let storage = RocksDbStorage::open(&config.database_path).with_context(|| {
                    format!("failed to open {}", config.database_path.display())
                })?;
                Arc::new(StorageDataStore::new(Arc::new(storage)))
            }
        };

        let allowlist = if config.valid_sha384_keys.is_empty() {
            KeyAllowlist::empty()
        } else {
            KeyAllowlist::fetch(&config.allowlist(), &reqwest::Client::new()).await
        };
        if config.auto_registration_enabled && allowlist.is_empty() {
            tracing::warn!("Auto-registration is enabled but no signing key is allow-listed");
        }

        Ok(Self::with_parts(config, store, authority, allowlist))
    }

    /// Assemble state from already-built components
    pub fn with_parts(
        config: Config,
        store: Arc<dyn DataStore>,
        authority: Arc<CertificateAuthority>,
        allowlist: KeyAllowlist,
    ) -> Self {
        let identity_service = Arc::new(IdentityCoreService::new(
            Arc::clone(&store),
            authority,
            allowlist,
            config.identity_core(),
        ));

        AppState {
            config,
            store,
            identity_service,
        }
    }
}
