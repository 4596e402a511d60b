use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use iotid_identity_core::IdentityCoreError;
use serde::{Deserialize, Serialize};

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Core(#[from] IdentityCoreError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing or invalid credentials".to_string(),
            ),
            ApiError::Core(err) => {
                let status = match err {
                    IdentityCoreError::InvalidInput(_)
                    | IdentityCoreError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                    IdentityCoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    IdentityCoreError::Conflict(_)
                    | IdentityCoreError::AlreadyEnrolled(_)
                    | IdentityCoreError::InvalidState(_) => StatusCode::CONFLICT,
                    IdentityCoreError::Disabled(_) | IdentityCoreError::NotEligible(_) => {
                        StatusCode::FORBIDDEN
                    }
                    IdentityCoreError::CaUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    IdentityCoreError::Config(_)
                    | IdentityCoreError::Crypto(_)
                    | IdentityCoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = if status.is_server_error() {
                    "An internal error occurred".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code(), message)
            }
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = code, error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse {
            code: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotid_identity_core::DeviceStatus;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (IdentityCoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (IdentityCoreError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (IdentityCoreError::Conflict("x".into()), StatusCode::CONFLICT),
            (IdentityCoreError::AlreadyEnrolled("x".into()), StatusCode::CONFLICT),
            (IdentityCoreError::Disabled("x".into()), StatusCode::FORBIDDEN),
            (IdentityCoreError::NotEligible("x".into()), StatusCode::FORBIDDEN),
            (
                IdentityCoreError::InvalidTransition {
                    from: DeviceStatus::Waiting,
                    to: DeviceStatus::Enrolled,
                },
                StatusCode::BAD_REQUEST,
            ),
            (IdentityCoreError::CaUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let (status, _, _) = ApiError::from(err).parts();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ApiError::from(IdentityCoreError::Config("secret path /etc/x".into()));
        let (status, code, message) = err.parts();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CONFIG_ERROR");
        assert!(!message.contains("/etc/x"));
    }
}
