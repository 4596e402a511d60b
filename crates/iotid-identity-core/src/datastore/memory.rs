//! In-memory DataStore.

use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

type NaturalKey = (String, String, String);

#[derive(Default)]
struct Inner {
    organizations: HashMap<Uuid, Organization>,
    organizations_by_name: HashMap<String, Uuid>,
    devices: HashMap<Uuid, Enrollment>,
    devices_by_natural_key: HashMap<NaturalKey, Uuid>,
}

impl Inner {
    fn resolve_organization(&self, org_ref: &str) -> Result<Uuid> {
        if let Some(id) = parse_ref(org_ref) {
            if self.organizations.contains_key(&id) {
                return Ok(id);
            }
        }
        self.organizations_by_name
            .get(org_ref)
            .copied()
            .ok_or_else(|| DataStoreError::organization_not_found(org_ref))
    }

    fn resolve_device(&self, device_ref: &str) -> Result<Uuid> {
        if let Some(id) = parse_ref(device_ref) {
            if self.devices.contains_key(&id) {
                return Ok(id);
            }
        }
        self.devices
            .values()
            .filter(|d| d.device.serial_number == device_ref)
            .map(|d| d.id)
            .min()
            .ok_or_else(|| DataStoreError::device_not_found(device_ref))
    }

    fn device_by_natural_key(&self, brand: &str, model: &str, serial: &str) -> Result<Uuid> {
        let key = (brand.to_string(), model.to_string(), serial.to_string());
        self.devices_by_natural_key
            .get(&key)
            .copied()
            .ok_or_else(|| DataStoreError::device_not_found(natural_key_label(brand, model)))
    }
}

/// DataStore kept entirely in process memory
///
/// Every write holds the lock for its whole read-check-write sequence.
#[derive(Default)]
pub struct MemoryDataStore {
    inner: RwLock<Inner>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn organization_new(&self, request: NewOrganization) -> Result<Uuid> {
        let mut inner = self.inner.write().await;

        if inner.organizations_by_name.contains_key(&request.name) {
            return Err(DataStoreError::Conflict(format!(
                "organization '{}' already exists",
                request.name
            )));
        }

        let organization = Organization {
            id: Uuid::now_v7(),
            name: request.name,
            country_name: request.country_name,
            root_cert: request.server_cert,
            root_key: request.server_key,
            created_at: current_timestamp(),
        };
        let id = organization.id;

        inner
            .organizations_by_name
            .insert(organization.name.clone(), id);
        inner.organizations.insert(id, organization);
        Ok(id)
    }

    async fn organization_get(&self, id: Uuid) -> Result<Organization> {
        self.inner
            .read()
            .await
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| DataStoreError::organization_not_found(id))
    }

    async fn organization_get_by_name(&self, name: &str) -> Result<Organization> {
        let inner = self.inner.read().await;
        inner
            .organizations_by_name
            .get(name)
            .and_then(|id| inner.organizations.get(id))
            .cloned()
            .ok_or_else(|| DataStoreError::organization_not_found(name))
    }

    async fn organization_list(&self) -> Result<Vec<Organization>> {
        let inner = self.inner.read().await;
        let mut organizations: Vec<Organization> =
            inner.organizations.values().cloned().collect();
        organizations.sort_by_key(|o| o.id);
        Ok(organizations)
    }

    async fn device_new(&self, enrollment: Enrollment) -> Result<Uuid> {
        let mut inner = self.inner.write().await;

        if !inner.organizations.contains_key(&enrollment.organization_id) {
            return Err(DataStoreError::organization_not_found(
                enrollment.organization_id,
            ));
        }
        let key = enrollment.natural_key();
        if inner.devices_by_natural_key.contains_key(&key) {
            return Err(natural_key_conflict(
                &enrollment.device.brand,
                &enrollment.device.model,
            ));
        }
        if inner.devices.contains_key(&enrollment.id) {
            return Err(DataStoreError::Conflict(format!(
                "device {} already exists",
                enrollment.id
            )));
        }

        let id = enrollment.id;
        inner.devices_by_natural_key.insert(key, id);
        inner.devices.insert(id, enrollment);
        Ok(id)
    }

    async fn device_get(&self, brand: &str, model: &str, serial: &str) -> Result<Enrollment> {
        let inner = self.inner.read().await;
        let id = inner.device_by_natural_key(brand, model, serial)?;
        inner
            .devices
            .get(&id)
            .cloned()
            .ok_or_else(|| DataStoreError::device_not_found(id))
    }

    async fn device_get_by_ref(&self, device_ref: &str) -> Result<Enrollment> {
        let inner = self.inner.read().await;
        let id = inner.resolve_device(device_ref)?;
        inner
            .devices
            .get(&id)
            .cloned()
            .ok_or_else(|| DataStoreError::device_not_found(id))
    }

    async fn device_list(&self, org_ref: &str) -> Result<Vec<Enrollment>> {
        let inner = self.inner.read().await;
        let organization_id = inner.resolve_organization(org_ref)?;

        let mut devices: Vec<Enrollment> = inner
            .devices
            .values()
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .collect();
        devices.sort_by_key(|d| d.id);
        Ok(devices)
    }

    async fn device_enroll(
        &self,
        brand: &str,
        model: &str,
        serial: &str,
        store_id: &str,
        device_key: &str,
    ) -> Result<Enrollment> {
        let mut inner = self.inner.write().await;
        let id = inner.device_by_natural_key(brand, model, serial)?;
        let enrollment = inner
            .devices
            .get_mut(&id)
            .ok_or_else(|| DataStoreError::device_not_found(id))?;

        apply_enroll(enrollment, store_id, device_key)?;
        Ok(enrollment.clone())
    }

    async fn device_update(&self, device_ref: &str, update: DeviceUpdate) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = inner.resolve_device(device_ref)?;
        let enrollment = inner
            .devices
            .get_mut(&id)
            .ok_or_else(|| DataStoreError::device_not_found(id))?;

        apply_update(enrollment, update);
        Ok(())
    }

    async fn device_delete(&self, device_id: Uuid) -> Result<Uuid> {
        let mut inner = self.inner.write().await;
        let enrollment = inner
            .devices
            .remove(&device_id)
            .ok_or_else(|| DataStoreError::device_not_found(device_id))?;

        inner
            .devices_by_natural_key
            .remove(&enrollment.natural_key());
        Ok(device_id)
    }
}
