//! Identity Core service implementation.

mod device;
mod enrollment;
mod organization;

#[cfg(test)]
pub(crate) use device::next_status;
pub use enrollment::split_enrollment_assertions;

use crate::{
    allowlist::KeyAllowlist, config::IdentityCoreConfig, datastore::DataStore, errors::*,
    traits::*, types::*,
};
use async_trait::async_trait;
use iotid_crypto::{Assertion, CertificateAuthority};
use std::sync::Arc;
use uuid::Uuid;

/// Identity Core service implementation
///
/// Stateless apart from the allowlist, which is read-only after startup;
/// a single instance is shared by all request handlers.
pub struct IdentityCoreService<D: DataStore + ?Sized> {
    store: Arc<D>,
    authority: Arc<CertificateAuthority>,
    allowlist: Arc<KeyAllowlist>,
    config: IdentityCoreConfig,
}

impl<D: DataStore + ?Sized> IdentityCoreService<D> {
    /// Create a new Identity Core service
    pub fn new(
        store: Arc<D>,
        authority: Arc<CertificateAuthority>,
        allowlist: KeyAllowlist,
        config: IdentityCoreConfig,
    ) -> Self {
        Self {
            store,
            authority,
            allowlist: Arc::new(allowlist),
            config,
        }
    }

    pub fn config(&self) -> &IdentityCoreConfig {
        &self.config
    }

    pub fn allowlist(&self) -> &KeyAllowlist {
        &self.allowlist
    }
}

#[async_trait]
impl<D: DataStore + ?Sized + 'static> IdentityCore for IdentityCoreService<D> {
    async fn register_organization(&self, name: &str, country_name: &str) -> Result<Uuid> {
        self.register_organization_internal(name, country_name)
            .await
    }

    async fn get_organization(&self, org_ref: &str) -> Result<Organization> {
        self.resolve_organization(org_ref).await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        Ok(self.store.organization_list().await?)
    }

    async fn register_device(&self, request: RegisterDeviceRequest) -> Result<Uuid> {
        self.register_device_internal(request).await
    }

    async fn enroll_device(
        &self,
        model: &Assertion,
        serial: &Assertion,
    ) -> Result<EnrolledDevice> {
        self.enroll_device_internal(model, serial).await
    }

    async fn update_device_status(
        &self,
        org_ref: &str,
        device_ref: &str,
        update: DeviceUpdate,
    ) -> Result<()> {
        self.update_device_status_internal(org_ref, device_ref, update)
            .await
    }

    async fn list_devices(&self, org_ref: &str) -> Result<Vec<Enrollment>> {
        self.list_devices_internal(org_ref).await
    }

    async fn get_device(&self, org_ref: &str, device_ref: &str) -> Result<Enrollment> {
        self.get_device_internal(org_ref, device_ref).await
    }

    async fn delete_device(&self, device_id: Uuid) -> Result<Uuid> {
        self.delete_device_internal(device_id).await
    }
}

/// Reject blank required fields
fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(IdentityCoreError::InvalidInput(format!(
            "{} is required",
            field
        )));
    }
    Ok(value)
}
