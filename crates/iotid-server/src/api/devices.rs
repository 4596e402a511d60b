use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use iotid_identity_core::{
    Device, DeviceStatus, DeviceUpdate, Enrollment, IdentityCore, RegisterDeviceRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    api::{
        helpers::{format_timestamp_rfc3339, parse_uuid},
        organizations::CreatedResponse,
    },
    error::ApiError,
    state::AppState,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    /// Organization id or name
    pub organization_id: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    #[serde(default)]
    pub device_data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    pub status: Option<u8>,
    pub device_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsInfo {
    /// Omitted from list responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    pub certificate: String,
    pub mqtt_url: String,
    pub mqtt_port: u16,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub device: Device,
    pub credentials: CredentialsInfo,
    pub status: DeviceStatus,
    pub device_data: String,
    pub created_at: String,
}

impl DeviceInfo {
    pub fn from_enrollment(
        enrollment: Enrollment,
        include_private_key: bool,
    ) -> Result<Self, ApiError> {
        let credentials = enrollment.credentials;
        Ok(Self {
            id: enrollment.id,
            organization_id: enrollment.organization_id,
            device: enrollment.device,
            credentials: CredentialsInfo {
                private_key: include_private_key.then_some(credentials.private_key),
                certificate: credentials.certificate,
                mqtt_url: credentials.mqtt_url,
                mqtt_port: credentials.mqtt_port,
            },
            status: enrollment.status,
            device_data: enrollment.device_data,
            created_at: format_timestamp_rfc3339(enrollment.created_at)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListDevicesResponse {
    pub devices: Vec<DeviceInfo>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/device
pub async fn create_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = payload?;

    let id = state
        .identity_service
        .register_device(RegisterDeviceRequest {
            organization: req.organization_id,
            brand: req.brand,
            model: req.model,
            serial_number: req.serial_number,
            device_data: req.device_data,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// DELETE /v1/device/:device_id
pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let device_id = parse_uuid(&device_id, "device id")?;
    let id = state.identity_service.delete_device(device_id).await?;
    Ok(Json(CreatedResponse { id }))
}

/// GET /v1/devices/:org_ref
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    Path(org_ref): Path<String>,
) -> Result<Json<ListDevicesResponse>, ApiError> {
    let devices = state
        .identity_service
        .list_devices(&org_ref)
        .await?
        .into_iter()
        .map(|enrollment| DeviceInfo::from_enrollment(enrollment, false))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ListDevicesResponse { devices }))
}

/// GET /v1/devices/:org_ref/:device_ref
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path((org_ref, device_ref)): Path<(String, String)>,
) -> Result<Json<DeviceInfo>, ApiError> {
    let enrollment = state
        .identity_service
        .get_device(&org_ref, &device_ref)
        .await?;
    Ok(Json(DeviceInfo::from_enrollment(enrollment, true)?))
}

/// PUT /v1/devices/:org_ref/:device_ref
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path((org_ref, device_ref)): Path<(String, String)>,
    payload: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;

    let status = req.status.map(DeviceStatus::try_from).transpose()?;
    state
        .identity_service
        .update_device_status(
            &org_ref,
            &device_ref,
            DeviceUpdate {
                status,
                device_data: req.device_data,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
