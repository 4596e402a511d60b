//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Platform CA missing, malformed, or mismatched with its key
    #[error("Certificate authority unavailable: {0}")]
    CaUnavailable(String),

    /// Key pair generation failed
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Certificate construction or signing failed
    #[error("Certificate generation failed: {0}")]
    CertificateGenerationFailed(String),

    /// Assertion text could not be decoded
    #[error("Invalid assertion: {0}")]
    InvalidAssertion(String),

    /// Public key uses an algorithm other than Ed25519
    #[error("Unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// Public key bytes are not a valid key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid key size
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Signature block is not a well-formed signature
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Assertion names a different signing key than the one supplied
    #[error("Signing key mismatch: assertion signed by {actual}, expected {expected}")]
    SigningKeyMismatch {
        /// Fingerprint of the supplied key
        expected: String,
        /// Fingerprint named by the assertion
        actual: String,
    },
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
