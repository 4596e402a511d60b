//! Persistence contract for organizations and devices.
//!
//! Implementations enforce uniqueness of organization names and of the
//! device natural key `(brand, model, serial_number)`, reporting violations
//! as [`DataStoreError::Conflict`].

mod memory;
mod storage;

pub use memory::MemoryDataStore;
pub use storage::StorageDataStore;

use crate::types::*;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// DataStore errors
#[derive(Debug, Error)]
pub enum DataStoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] iotid_storage::StorageError),
}

impl DataStoreError {
    pub(crate) fn organization_not_found(key: impl ToString) -> Self {
        DataStoreError::NotFound {
            entity: "organization",
            key: key.to_string(),
        }
    }

    pub(crate) fn device_not_found(key: impl ToString) -> Self {
        DataStoreError::NotFound {
            entity: "device",
            key: key.to_string(),
        }
    }
}

/// Result type for DataStore operations
pub type Result<T> = std::result::Result<T, DataStoreError>;

/// Repository for organizations and device enrollments
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Create an organization; fails with `Conflict` if the name is taken
    async fn organization_new(&self, request: NewOrganization) -> Result<Uuid>;

    async fn organization_get(&self, id: Uuid) -> Result<Organization>;

    async fn organization_get_by_name(&self, name: &str) -> Result<Organization>;

    /// All organizations in creation order
    async fn organization_list(&self) -> Result<Vec<Organization>>;

    /// Persist a new device; fails with `Conflict` if the natural key is taken
    async fn device_new(&self, enrollment: Enrollment) -> Result<Uuid>;

    /// Look up a device by natural key
    async fn device_get(&self, brand: &str, model: &str, serial: &str) -> Result<Enrollment>;

    /// Look up a device by id, falling back to serial number
    async fn device_get_by_ref(&self, device_ref: &str) -> Result<Enrollment>;

    /// Devices of an organization given by id, falling back to name
    async fn device_list(&self, org_ref: &str) -> Result<Vec<Enrollment>>;

    /// Atomically set `store_id`, `device_key` and `status = Enrolled`.
    ///
    /// Only a device in `Waiting` can be enrolled; any other status is a
    /// `Conflict` and leaves the record untouched.
    async fn device_enroll(
        &self,
        brand: &str,
        model: &str,
        serial: &str,
        store_id: &str,
        device_key: &str,
    ) -> Result<Enrollment>;

    /// Apply a partial update to the device given by id or serial number
    async fn device_update(&self, device_ref: &str, update: DeviceUpdate) -> Result<()>;

    async fn device_delete(&self, device_id: Uuid) -> Result<Uuid>;
}

fn parse_ref(reference: &str) -> Option<Uuid> {
    Uuid::parse_str(reference).ok()
}

fn apply_update(enrollment: &mut Enrollment, update: DeviceUpdate) {
    if let Some(status) = update.status {
        enrollment.status = status;
    }
    if let Some(device_data) = update.device_data {
        enrollment.device_data = device_data;
    }
}

fn apply_enroll(enrollment: &mut Enrollment, store_id: &str, device_key: &str) -> Result<()> {
    if enrollment.status != DeviceStatus::Waiting {
        return Err(DataStoreError::Conflict(format!(
            "device {} is {}, not waiting",
            enrollment.id, enrollment.status
        )));
    }
    enrollment.device.store_id = store_id.to_string();
    enrollment.device.device_key = device_key.to_string();
    enrollment.status = DeviceStatus::Enrolled;
    Ok(())
}

fn natural_key_conflict(brand: &str, model: &str) -> DataStoreError {
    DataStoreError::Conflict(format!(
        "device {}/{} with this serial number already exists",
        brand, model
    ))
}

fn natural_key_label(brand: &str, model: &str) -> String {
    format!("{}/{}", brand, model)
}
