//! Identity Core type definitions.

use crate::errors::IdentityCoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use iotid_crypto::current_timestamp;

/// Organization record
///
/// `root_cert`/`root_key` hold the server certificate issued at creation.
/// `root_key` never leaves the process through the HTTP surface.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub country_name: String,
    pub root_cert: String,
    pub root_key: String,
    pub created_at: u64,
}

impl fmt::Debug for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organization")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("country_name", &self.country_name)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Input to `DataStore::organization_new`
#[derive(Clone)]
pub struct NewOrganization {
    pub name: String,
    pub country_name: String,
    pub server_key: String,
    pub server_cert: String,
}

/// Device enrollment status
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeviceStatus {
    Waiting = 0x01,
    Enrolled = 0x02,
    Disabled = 0x03,
}

impl TryFrom<u8> for DeviceStatus {
    type Error = IdentityCoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(DeviceStatus::Waiting),
            0x02 => Ok(DeviceStatus::Enrolled),
            0x03 => Ok(DeviceStatus::Disabled),
            other => Err(IdentityCoreError::InvalidInput(format!(
                "unknown device status: {}",
                other
            ))),
        }
    }
}

impl From<DeviceStatus> for u8 {
    fn from(status: DeviceStatus) -> u8 {
        status as u8
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceStatus::Waiting => "waiting",
            DeviceStatus::Enrolled => "enrolled",
            DeviceStatus::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Identity of a physical device
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    /// Set from the model assertion at enrollment
    pub store_id: String,
    /// Device public key from the serial assertion, set at enrollment
    pub device_key: String,
}

/// Credentials handed to a device at enrollment
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// PKCS#1 PEM
    pub private_key: String,
    /// X.509 PEM signed by the platform CA
    pub certificate: String,
    pub mqtt_url: String,
    pub mqtt_port: u16,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("mqtt_url", &self.mqtt_url)
            .field("mqtt_port", &self.mqtt_port)
            .finish_non_exhaustive()
    }
}

/// Device registration record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrollment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub device: Device,
    pub credentials: Credentials,
    pub status: DeviceStatus,
    pub device_data: String,
    pub created_at: u64,
}

impl Enrollment {
    /// `(brand, model, serial_number)`
    pub fn natural_key(&self) -> (String, String, String) {
        (
            self.device.brand.clone(),
            self.device.model.clone(),
            self.device.serial_number.clone(),
        )
    }
}

/// Result of a successful enrollment, with the owning organization
#[derive(Debug, Clone)]
pub struct EnrolledDevice {
    pub enrollment: Enrollment,
    pub organization: Organization,
}

/// Register device request
#[derive(Debug, Clone, Default)]
pub struct RegisterDeviceRequest {
    /// Organization id (or name)
    pub organization: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub device_data: String,
}

/// Partial update applied by `DataStore::device_update`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub status: Option<DeviceStatus>,
    pub device_data: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.device_data.is_none()
    }
}
