use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Json,
};
use iotid_crypto::ASSERTION_MEDIA_TYPE;
use iotid_identity_core::{split_enrollment_assertions, IdentityCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{api::devices::DeviceInfo, error::ApiError, state::AppState};

/// Organization summary embedded in an enrollment response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollOrganization {
    pub id: Uuid,
    pub name: String,
    pub root_cert: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollResponse {
    #[serde(flatten)]
    pub device: DeviceInfo,
    pub organization: EnrollOrganization,
}

/// POST /v1/device/enroll
///
/// Body is the model and serial assertions, in either order.
pub async fn enroll_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EnrollResponse>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with(ASSERTION_MEDIA_TYPE) {
        return Err(ApiError::InvalidRequest(format!(
            "Content-Type must be {}",
            ASSERTION_MEDIA_TYPE
        )));
    }

    let (model, serial) = split_enrollment_assertions(&body)?;
    let enrolled = state.identity_service.enroll_device(&model, &serial).await?;
    let organization = enrolled.organization;

    Ok(Json(EnrollResponse {
        device: DeviceInfo::from_enrollment(enrolled.enrollment, true)?,
        organization: EnrollOrganization {
            id: organization.id,
            name: organization.name,
            root_cert: organization.root_cert,
        },
    }))
}
