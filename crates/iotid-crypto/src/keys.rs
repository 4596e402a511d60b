//! Ed25519 account keys used to sign and verify assertions.

use crate::{constants::*, errors::*, hashing::key_fingerprint};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Ed25519 signing key pair
#[derive(Clone)]
pub struct Ed25519KeyPair {
    /// Private signing key (32 bytes)
    private_key: SigningKey,
    /// Public verification key (32 bytes)
    public_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a fresh key pair from the OS random source
    pub fn generate() -> Self {
        let private_key = SigningKey::generate(&mut OsRng);
        let public_key = private_key.verifying_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Build a key pair from a 32-byte seed
    ///
    /// The seed MUST be 32 bytes of high-entropy random data.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let private_key = SigningKey::from_bytes(seed);
        let public_key = private_key.verifying_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.to_bytes()
    }

    /// Get a reference to the private key
    ///
    /// # Security
    ///
    /// Use with extreme caution. Never log or persist.
    pub fn private_key(&self) -> &SigningKey {
        &self.private_key
    }

    /// Public half, in the form published by account-key assertions
    pub fn account_public_key(&self) -> AccountPublicKey {
        AccountPublicKey {
            key: self.public_key,
        }
    }

    /// SHA-384 fingerprint of the public key
    pub fn key_id(&self) -> String {
        key_fingerprint(self.public_key.as_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// Public key of an account allowed to sign assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPublicKey {
    key: VerifyingKey,
}

impl AccountPublicKey {
    /// Parse a raw 32-byte Ed25519 public key
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeySize {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Decode an account-key assertion body: `ed25519 <base64 key>`
    pub fn decode(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|_| CryptoError::InvalidPublicKey("key body is not UTF-8".to_string()))?
            .trim();
        let (algorithm, encoded) = text.split_once(' ').ok_or_else(|| {
            CryptoError::InvalidPublicKey("expected '<algorithm> <key>'".to_string())
        })?;
        if algorithm != PUBLIC_KEY_ALGORITHM {
            return Err(CryptoError::UnsupportedKeyAlgorithm(algorithm.to_string()));
        }
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Encode as an account-key assertion body
    pub fn encode(&self) -> String {
        format!(
            "{} {}",
            PUBLIC_KEY_ALGORITHM,
            STANDARD.encode(self.key.as_bytes())
        )
    }

    /// SHA-384 fingerprint, as referenced by `sign-key-sha3-384`
    pub fn key_id(&self) -> String {
        key_fingerprint(self.key.as_bytes())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}
