//! Identity Core error types.

use crate::{datastore::DataStoreError, types::DeviceStatus};
use iotid_crypto::CryptoError;
use thiserror::Error;

/// Identity Core errors
#[derive(Debug, Error)]
pub enum IdentityCoreError {
    /// Missing required field, wrong assertion type, or header disagreement
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Organization or device not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate organization name or device natural key
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Device already enrolled: {0}")]
    AlreadyEnrolled(String),

    #[error("Device disabled: {0}")]
    Disabled(String),

    #[error("Device in unexpected state: {0}")]
    InvalidState(String),

    /// Requested status change is not allowed
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: DeviceStatus, to: DeviceStatus },

    /// Auto-registration denied
    #[error("Not eligible for auto-registration: {0}")]
    NotEligible(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Certificate authority unavailable: {0}")]
    CaUnavailable(String),

    #[error("Cryptographic error: {0}")]
    Crypto(CryptoError),

    /// Underlying store failure
    #[error("Storage error: {0}")]
    Storage(#[from] iotid_storage::StorageError),
}

impl IdentityCoreError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            IdentityCoreError::InvalidInput(_) => "INVALID_INPUT",
            IdentityCoreError::NotFound(_) => "NOT_FOUND",
            IdentityCoreError::Conflict(_) => "CONFLICT",
            IdentityCoreError::AlreadyEnrolled(_) => "ALREADY_ENROLLED",
            IdentityCoreError::Disabled(_) => "DISABLED",
            IdentityCoreError::InvalidState(_) => "INVALID_STATE",
            IdentityCoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            IdentityCoreError::NotEligible(_) => "NOT_ELIGIBLE",
            IdentityCoreError::Config(_) => "CONFIG_ERROR",
            IdentityCoreError::CaUnavailable(_) => "CA_UNAVAILABLE",
            IdentityCoreError::Crypto(_) => "CRYPTO_ERROR",
            IdentityCoreError::Storage(_) => "IO_ERROR",
        }
    }
}

impl From<CryptoError> for IdentityCoreError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::CaUnavailable(message) => IdentityCoreError::CaUnavailable(message),
            other => IdentityCoreError::Crypto(other),
        }
    }
}

impl From<DataStoreError> for IdentityCoreError {
    fn from(err: DataStoreError) -> Self {
        match err {
            DataStoreError::NotFound { .. } => IdentityCoreError::NotFound(err.to_string()),
            DataStoreError::Conflict(message) => IdentityCoreError::Conflict(message),
            DataStoreError::Storage(e) => IdentityCoreError::Storage(e),
        }
    }
}

/// Result type for Identity Core operations
pub type Result<T> = std::result::Result<T, IdentityCoreError>;
