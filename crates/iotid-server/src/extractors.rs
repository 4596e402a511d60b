use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use iotid_crypto::constant_time_compare;
use std::sync::Arc;

use crate::{config::AuthProvider, error::ApiError, state::AppState};

/// Proof that the caller passed the admin listener's auth provider
///
/// Used as a route layer on the admin router so every admin handler is
/// covered without naming it in each signature.
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let secret = match &state.config.auth_provider {
            AuthProvider::Disabled => return Ok(AdminAuth),
            AuthProvider::StaticClient { secret } => secret,
        };

        let token = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_compare(token.as_bytes(), secret.as_bytes()) {
            tracing::warn!(uri = %parts.uri, "Rejected admin request with invalid token");
            return Err(ApiError::Unauthorized);
        }

        Ok(AdminAuth)
    }
}
