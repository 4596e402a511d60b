//! Identity Core trait definitions.

use crate::{errors::Result, types::*};
use async_trait::async_trait;
use iotid_crypto::Assertion;
use uuid::Uuid;

/// Identity Core subsystem trait
///
/// Organization and device references (`org_ref`, `device_ref`) are matched
/// first as an id, then as an organization name or device serial number.
#[async_trait]
pub trait IdentityCore: Send + Sync {
    /// Create an organization and issue its server certificate
    async fn register_organization(&self, name: &str, country_name: &str) -> Result<Uuid>;

    async fn get_organization(&self, org_ref: &str) -> Result<Organization>;

    async fn list_organizations(&self) -> Result<Vec<Organization>>;

    /// Pre-register a device and issue its client certificate
    async fn register_device(&self, request: RegisterDeviceRequest) -> Result<Uuid>;

    /// Enroll a device from its model and serial assertions
    ///
    /// The owning organization is resolved before the device is marked
    /// `Enrolled`.
    async fn enroll_device(
        &self,
        model: &Assertion,
        serial: &Assertion,
    ) -> Result<EnrolledDevice>;

    /// Administrative status and device data update
    async fn update_device_status(
        &self,
        org_ref: &str,
        device_ref: &str,
        update: DeviceUpdate,
    ) -> Result<()>;

    async fn list_devices(&self, org_ref: &str) -> Result<Vec<Enrollment>>;

    async fn get_device(&self, org_ref: &str, device_ref: &str) -> Result<Enrollment>;

    /// Unconditionally remove a device
    async fn delete_device(&self, device_id: Uuid) -> Result<Uuid>;
}
