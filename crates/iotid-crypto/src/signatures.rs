//! Assertion signatures using Ed25519.

use crate::{
    assertion::Assertion,
    constants::*,
    errors::*,
    keys::{AccountPublicKey, Ed25519KeyPair},
};
use ed25519_dalek::{Signature, Signer};

/// Sign the content of an assertion
///
/// # Returns
///
/// 64-byte Ed25519 signature
pub fn sign_content(keypair: &Ed25519KeyPair, content: &[u8]) -> [u8; SIGNATURE_SIZE] {
    keypair.private_key().sign(content).to_bytes()
}

/// Verify an assertion's signature against an account public key
///
/// The assertion must name `public_key` in its `sign-key-sha3-384` header
/// and carry a valid signature over its content.
///
/// # Returns
///
/// `Ok(())` if signature is valid, `Err` otherwise
pub fn verify_assertion(assertion: &Assertion, public_key: &AccountPublicKey) -> Result<()> {
    let expected = public_key.key_id();
    let actual = assertion.sign_key_id().unwrap_or_default();
    if actual != expected {
        return Err(CryptoError::SigningKeyMismatch {
            expected,
            actual: actual.to_string(),
        });
    }

    let signature: [u8; SIGNATURE_SIZE] = assertion
        .signature()
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature);

    public_key
        .verifying_key()
        .verify_strict(assertion.content(), &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

/// Extract the public key published by an account-key assertion
///
/// Checks the assertion type and that the `public-key-sha3-384` header
/// matches the fingerprint of the key in the body.
pub fn account_key_from_assertion(assertion: &Assertion) -> Result<AccountPublicKey> {
    if assertion.type_name() != assertion_types::ACCOUNT_KEY {
        return Err(CryptoError::InvalidAssertion(format!(
            "expected account-key assertion, got '{}'",
            assertion.type_name()
        )));
    }

    let public_key = AccountPublicKey::decode(assertion.body())?;
    let declared = assertion.header(headers::PUBLIC_KEY_ID).unwrap_or_default();
    if declared != public_key.key_id() {
        return Err(CryptoError::InvalidAssertion(
            "public-key-sha3-384 does not match the key in the body".to_string(),
        ));
    }

    Ok(public_key)
}
