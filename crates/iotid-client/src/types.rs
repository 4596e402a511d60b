/*!
 * Wire types returned by the iotid server
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInfo {
    pub id: Uuid,
    pub name: String,
    pub country_name: String,
    pub root_cert: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrganizationsResponse {
    pub organizations: Vec<OrganizationInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub store_id: String,
    pub device_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsInfo {
    pub private_key: Option<String>,
    pub certificate: String,
    pub mqtt_url: String,
    pub mqtt_port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub device: DeviceIdentity,
    pub credentials: CredentialsInfo,
    pub status: u8,
    pub device_data: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListDevicesResponse {
    pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOrganization {
    pub id: Uuid,
    pub name: String,
    pub root_cert: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollResponse {
    #[serde(flatten)]
    pub device: DeviceInfo,
    pub organization: EnrollOrganization,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_data: Option<String>,
}

/// Human name of a numeric device status
pub fn status_name(status: u8) -> &'static str {
    match status {
        1 => "WAITING",
        2 => "ENROLLED",
        3 => "DISABLED",
        _ => "UNKNOWN",
    }
}
