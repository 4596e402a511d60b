//! Cryptographic constants, file names and assertion header names.

/// Size of Ed25519 public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of Ed25519 signatures in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Modulus size for every RSA key the authority generates
pub const RSA_KEY_BITS: usize = 2048;

/// Certificate serial numbers are 128 random bits
pub const SERIAL_NUMBER_SIZE: usize = 16;

/// Issued certificates are valid until the last day of this year
pub const CERTIFICATE_NOT_AFTER_YEAR: i32 = 2049;

/// Platform CA certificate file inside the certificates directory
pub const CA_CERT_FILE: &str = "ca.crt";

/// Platform CA private key file inside the certificates directory
pub const CA_KEY_FILE: &str = "ca.key";

/// Media type of assertion streams
pub const ASSERTION_MEDIA_TYPE: &str = "application/x.ubuntu.assertion";

/// Algorithm tag prefixed to encoded account public keys
pub const PUBLIC_KEY_ALGORITHM: &str = "ed25519";

/// Header names used by the identity core
pub mod headers {
    /// Assertion type (`model`, `serial`, `account-key`)
    pub const TYPE: &str = "type";
    /// Fingerprint of the key that signed the assertion
    pub const SIGN_KEY: &str = "sign-key-sha3-384";
    /// Length in bytes of the optional body
    pub const BODY_LENGTH: &str = "body-length";
    /// Fingerprint of the key published by an account-key assertion
    pub const PUBLIC_KEY_ID: &str = "public-key-sha3-384";
    /// Account that owns an account-key
    pub const ACCOUNT_ID: &str = "account-id";
    /// Brand of a model or serial assertion
    pub const BRAND_ID: &str = "brand-id";
    /// Model name
    pub const MODEL: &str = "model";
    /// Device serial number
    pub const SERIAL: &str = "serial";
    /// Device-held public key
    pub const DEVICE_KEY: &str = "device-key";
    /// Store the model is bound to
    pub const STORE: &str = "store";
}

/// Assertion type names
pub mod assertion_types {
    /// Model assertion
    pub const MODEL: &str = "model";
    /// Serial assertion
    pub const SERIAL: &str = "serial";
    /// Account-key assertion
    pub const ACCOUNT_KEY: &str = "account-key";
}
