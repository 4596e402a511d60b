use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use iotid_identity_core::{IdentityCore, Organization};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{api::helpers::format_timestamp_rfc3339, error::ApiError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub country_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Organization as exposed over HTTP; the server key is never included
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInfo {
    pub id: Uuid,
    pub name: String,
    pub country_name: String,
    pub root_cert: String,
    pub created_at: String,
}

impl OrganizationInfo {
    pub fn from_organization(organization: Organization) -> Result<Self, ApiError> {
        Ok(Self {
            id: organization.id,
            created_at: format_timestamp_rfc3339(organization.created_at)?,
            name: organization.name,
            country_name: organization.country_name,
            root_cert: organization.root_cert,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListOrganizationsResponse {
    pub organizations: Vec<OrganizationInfo>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/organization
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = payload?;

    let id = state
        .identity_service
        .register_organization(&req.name, &req.country_name)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /v1/organizations
pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListOrganizationsResponse>, ApiError> {
    let organizations = state
        .identity_service
        .list_organizations()
        .await?
        .into_iter()
        .map(OrganizationInfo::from_organization)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ListOrganizationsResponse { organizations }))
}

/// GET /v1/organization/:org_ref
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(org_ref): Path<String>,
) -> Result<Json<OrganizationInfo>, ApiError> {
    let organization = state.identity_service.get_organization(&org_ref).await?;
    Ok(Json(OrganizationInfo::from_organization(organization)?))
}
