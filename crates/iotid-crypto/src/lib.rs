//! # iotid-crypto
//!
//! Cryptographic building blocks for the device identity service.
//!
//! - [`CertificateAuthority`]: loads the platform CA from disk and issues
//!   RSA-2048 leaf certificates for organizations and devices
//! - [`Assertion`]: the signed, text-framed documents devices present at
//!   enrollment (model, serial) and the account-key assertions that publish
//!   the public keys allowed to sign them
//! - SHA-384 key fingerprints and small helpers shared by the other crates

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod assertion;
pub mod authority;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod signatures;
pub mod utils;

pub use assertion::{decode_stream, encode_assertion, Assertion};
pub use authority::{CertificateAuthority, IssuedCertificate};
pub use constants::*;
pub use errors::{CryptoError, Result};
pub use hashing::*;
pub use keys::{AccountPublicKey, Ed25519KeyPair};
pub use signatures::*;
pub use utils::current_timestamp;
