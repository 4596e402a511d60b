//! DataStore over the key-value [`Storage`] trait.

use super::*;
use iotid_storage::{
    BatchExt, Storage, CF_DEVICES, CF_DEVICES_BY_NATURAL_KEY, CF_DEVICES_BY_ORGANIZATION,
    CF_DEVICES_BY_SERIAL, CF_ORGANIZATIONS, CF_ORGANIZATIONS_BY_NAME,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// DataStore persisted through a [`Storage`] backend
///
/// Writes are serialized by `write_lock` so that uniqueness checks and the
/// `Waiting` → `Enrolled` compare-and-set see a stable view. Multi-key
/// writes are committed as a single batch.
pub struct StorageDataStore<S: Storage> {
    storage: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: Storage> StorageDataStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    async fn load_device(&self, id: Uuid) -> Result<Enrollment> {
        self.storage
            .get(CF_DEVICES, &id)
            .await?
            .ok_or_else(|| DataStoreError::device_not_found(id))
    }

    async fn device_id_by_natural_key(&self, brand: &str, model: &str, serial: &str) -> Result<Uuid> {
        self.storage
            .get(CF_DEVICES_BY_NATURAL_KEY, &(brand, model, serial))
            .await?
            .ok_or_else(|| DataStoreError::device_not_found(natural_key_label(brand, model)))
    }

    async fn resolve_device(&self, device_ref: &str) -> Result<Enrollment> {
        if let Some(id) = parse_ref(device_ref) {
            if let Some(enrollment) = self.storage.get(CF_DEVICES, &id).await? {
                return Ok(enrollment);
            }
        }

        // Index keys are (serial, id), so the first hit has the lowest id.
        let matches: Vec<(Vec<u8>, Uuid)> = self
            .storage
            .get_by_prefix(CF_DEVICES_BY_SERIAL, &device_ref)
            .await?;
        match matches.first() {
            Some((_, id)) => self.load_device(*id).await,
            None => Err(DataStoreError::device_not_found(device_ref)),
        }
    }

    async fn resolve_organization(&self, org_ref: &str) -> Result<Uuid> {
        if let Some(id) = parse_ref(org_ref) {
            if self.storage.exists(CF_ORGANIZATIONS, &id).await? {
                return Ok(id);
            }
        }
        self.storage
            .get(CF_ORGANIZATIONS_BY_NAME, &org_ref)
            .await?
            .ok_or_else(|| DataStoreError::organization_not_found(org_ref))
    }
}

#[async_trait]
impl<S: Storage + 'static> DataStore for StorageDataStore<S> {
    async fn organization_new(&self, request: NewOrganization) -> Result<Uuid> {
        let _guard = self.write_lock.lock().await;

        if self
            .storage
            .exists(CF_ORGANIZATIONS_BY_NAME, &request.name)
            .await?
        {
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

        let mut batch = self.storage.batch();
        batch.put(CF_ORGANIZATIONS, &organization.id, &organization)?;
        batch.put(CF_ORGANIZATIONS_BY_NAME, &organization.name, &organization.id)?;
        batch.commit().await?;

        debug!(organization_id = %organization.id, "Stored organization");
        Ok(organization.id)
    }

    async fn organization_get(&self, id: Uuid) -> Result<Organization> {
        self.storage
            .get(CF_ORGANIZATIONS, &id)
            .await?
            .ok_or_else(|| DataStoreError::organization_not_found(id))
    }

    async fn organization_get_by_name(&self, name: &str) -> Result<Organization> {
        let id: Uuid = self
            .storage
            .get(CF_ORGANIZATIONS_BY_NAME, &name)
            .await?
            .ok_or_else(|| DataStoreError::organization_not_found(name))?;
        self.organization_get(id).await
    }

    async fn organization_list(&self) -> Result<Vec<Organization>> {
        let entries: Vec<(Vec<u8>, Organization)> =
            self.storage.scan_all(CF_ORGANIZATIONS).await?;
        Ok(entries.into_iter().map(|(_, org)| org).collect())
    }

    async fn device_new(&self, enrollment: Enrollment) -> Result<Uuid> {
        let _guard = self.write_lock.lock().await;

        if !self
            .storage
            .exists(CF_ORGANIZATIONS, &enrollment.organization_id)
            .await?
        {
            return Err(DataStoreError::organization_not_found(
                enrollment.organization_id,
            ));
        }
        let natural_key = enrollment.natural_key();
        if self
            .storage
            .exists(CF_DEVICES_BY_NATURAL_KEY, &natural_key)
            .await?
        {
            return Err(natural_key_conflict(
                &enrollment.device.brand,
                &enrollment.device.model,
            ));
        }
        if self.storage.exists(CF_DEVICES, &enrollment.id).await? {
            return Err(DataStoreError::Conflict(format!(
                "device {} already exists",
                enrollment.id
            )));
        }

        let id = enrollment.id;
        let mut batch = self.storage.batch();
        batch.put(CF_DEVICES, &id, &enrollment)?;
        batch.put(CF_DEVICES_BY_NATURAL_KEY, &natural_key, &id)?;
        batch.put(
            CF_DEVICES_BY_ORGANIZATION,
            &(enrollment.organization_id, id),
            &id,
        )?;
        batch.put(
            CF_DEVICES_BY_SERIAL,
            &(&enrollment.device.serial_number, id),
            &id,
        )?;
        batch.commit().await?;

        debug!(device_id = %id, "Stored device");
        Ok(id)
    }

    async fn device_get(&self, brand: &str, model: &str, serial: &str) -> Result<Enrollment> {
        let id = self.device_id_by_natural_key(brand, model, serial).await?;
        self.load_device(id).await
    }

    async fn device_get_by_ref(&self, device_ref: &str) -> Result<Enrollment> {
        self.resolve_device(device_ref).await
    }

    async fn device_list(&self, org_ref: &str) -> Result<Vec<Enrollment>> {
        let organization_id = self.resolve_organization(org_ref).await?;

        let index: Vec<(Vec<u8>, Uuid)> = self
            .storage
            .get_by_prefix(CF_DEVICES_BY_ORGANIZATION, &organization_id)
            .await?;

        let mut devices: Vec<Enrollment> = Vec::with_capacity(index.len());
        for (_, id) in index {
            if let Some(enrollment) = self.storage.get(CF_DEVICES, &id).await? {
                devices.push(enrollment);
            }
        }
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
        let _guard = self.write_lock.lock().await;

        let id = self.device_id_by_natural_key(brand, model, serial).await?;
        let mut enrollment = self.load_device(id).await?;
        apply_enroll(&mut enrollment, store_id, device_key)?;

        self.storage.put(CF_DEVICES, &id, &enrollment).await?;
        Ok(enrollment)
    }

    async fn device_update(&self, device_ref: &str, update: DeviceUpdate) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut enrollment = self.resolve_device(device_ref).await?;
        apply_update(&mut enrollment, update);

        self.storage
            .put(CF_DEVICES, &enrollment.id, &enrollment)
            .await?;
        Ok(())
    }

    async fn device_delete(&self, device_id: Uuid) -> Result<Uuid> {
        let _guard = self.write_lock.lock().await;

        let enrollment = self.load_device(device_id).await?;

        let mut batch = self.storage.batch();
        batch.delete(CF_DEVICES, &device_id)?;
        batch.delete(CF_DEVICES_BY_NATURAL_KEY, &enrollment.natural_key())?;
        batch.delete(
            CF_DEVICES_BY_ORGANIZATION,
            &(enrollment.organization_id, device_id),
        )?;
        batch.delete(
            CF_DEVICES_BY_SERIAL,
            &(&enrollment.device.serial_number, device_id),
        )?;
        batch.commit().await?;

        debug!(device_id = %device_id, "Deleted device");
        Ok(device_id)
    }
}
