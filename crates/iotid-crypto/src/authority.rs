//! Certificate authority issuing TLS credentials for devices and organizations.
//!
//! The CA certificate and key are loaded once at startup from `ca.crt` and
//! `ca.key`. Every issued certificate gets a fresh RSA-2048 key, a random
//! 128-bit serial, and is valid from the moment of issue until the end
//! of 2049.

use crate::{constants::*, errors::*};
use rand::{rngs::OsRng, RngCore};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SerialNumber,
};
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey},
    pkcs8::{EncodePrivateKey, LineEnding},
    RsaPrivateKey,
};
use std::path::Path;
use time::OffsetDateTime;
use tracing::{debug, info};
use zeroize::Zeroizing;

const PKCS1_PEM_LABEL: &str = "BEGIN RSA PRIVATE KEY";

/// A freshly issued certificate together with its private key
#[derive(Clone)]
pub struct IssuedCertificate {
    /// PKCS#1 PEM ("RSA PRIVATE KEY")
    pub private_key_pem: String,
    /// X.509 PEM ("CERTIFICATE")
    pub certificate_pem: String,
}

impl std::fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("certificate_pem", &self.certificate_pem)
            .field("private_key_pem", &"[REDACTED]")
            .finish()
    }
}

/// Platform certificate authority
pub struct CertificateAuthority {
    issuer: Certificate,
    key: KeyPair,
    certificate_pem: String,
}

impl CertificateAuthority {
    /// Load the CA from `<dir>/ca.crt` and `<dir>/ca.key`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let cert_path = dir.join(CA_CERT_FILE);
        let key_path = dir.join(CA_KEY_FILE);

        let cert_pem = std::fs::read_to_string(&cert_path).map_err(|e| {
            CryptoError::CaUnavailable(format!("{}: {}", cert_path.display(), e))
        })?;
        let key_pem = Zeroizing::new(std::fs::read_to_string(&key_path).map_err(|e| {
            CryptoError::CaUnavailable(format!("{}: {}", key_path.display(), e))
        })?);

        let authority = Self::from_pem(&cert_pem, &key_pem)?;
        info!(path = %dir.display(), "Loaded certificate authority");
        Ok(authority)
    }

    /// Build the CA from PEM-encoded certificate and key.
    ///
    /// The key may be PKCS#8 or PKCS#1 (RSA); it must match the
    /// certificate's public key.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let key = load_key_pair(key_pem)?;

        let (_, pem) = x509_parser::pem::parse_x509_pem(cert_pem.as_bytes())
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA certificate: {}", e)))?;
        let parsed = pem
            .parse_x509()
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA certificate: {}", e)))?;

        if !parsed.is_ca() {
            return Err(CryptoError::CaUnavailable(
                "certificate is not a CA certificate".to_string(),
            ));
        }
        if key.public_key_raw() != &*parsed.public_key().subject_public_key.data {
            return Err(CryptoError::CaUnavailable(
                "CA key does not match CA certificate".to_string(),
            ));
        }

        let params = CertificateParams::from_ca_cert_pem(cert_pem)
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA certificate: {}", e)))?;
        // Issued certificates only take the issuer DN and key from this.
        let issuer = params
            .self_signed(&key)
            .map_err(|e| CryptoError::CaUnavailable(e.to_string()))?;

        Ok(Self {
            issuer,
            key,
            certificate_pem: cert_pem.to_string(),
        })
    }

    /// Create a new self-signed ECDSA P-256 CA.
    ///
    /// # Returns
    ///
    /// `(certificate_pem, private_key_pem)`
    pub fn create_self_signed(common_name: &str) -> Result<(String, String)> {
        let key = KeyPair::generate()
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name, common_name, None);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.serial_number = Some(random_serial());
        params.not_before = OffsetDateTime::now_utc();
        params.not_after = rcgen::date_time_ymd(CERTIFICATE_NOT_AFTER_YEAR, 12, 31);

        let cert = params
            .self_signed(&key)
            .map_err(|e| CryptoError::CertificateGenerationFailed(e.to_string()))?;

        Ok((cert.pem(), key.serialize_pem()))
    }

    /// PEM of the CA certificate
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// Issue a TLS server certificate for an organization
    ///
    /// Subject is `CN=<name>, O=<name>, C=<country>`; `C` is left out when
    /// `country` is empty.
    pub async fn issue_server_certificate(
        &self,
        name: &str,
        country: &str,
    ) -> Result<IssuedCertificate> {
        let country = Some(country).filter(|c| !c.is_empty());
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(name, name, country);
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let issued = self.issue(params).await?;
        debug!(organization = %name, "Issued server certificate");
        Ok(issued)
    }

    /// Issue a TLS client certificate for an enrolled device
    ///
    /// Subject is `CN=<device id>, O=<organization name>`.
    pub async fn issue_client_certificate(
        &self,
        organization_name: &str,
        device_id: &str,
    ) -> Result<IssuedCertificate> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(device_id, organization_name, None);
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ClientAuth,
            ExtendedKeyUsagePurpose::ServerAuth,
        ];

        let issued = self.issue(params).await?;
        debug!(device_id = %device_id, "Issued client certificate");
        Ok(issued)
    }

    async fn issue(&self, mut params: CertificateParams) -> Result<IssuedCertificate> {
        let rsa_key = tokio::task::spawn_blocking(|| RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS))
            .await
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;

        let pkcs8 = rsa_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let private_key_pem = rsa_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let leaf_key = KeyPair::from_pem(&pkcs8)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;

        params.is_ca = IsCa::NoCa;
        params.serial_number = Some(random_serial());
        params.not_before = OffsetDateTime::now_utc();
        params.not_after = rcgen::date_time_ymd(CERTIFICATE_NOT_AFTER_YEAR, 12, 31);
        params.use_authority_key_identifier_extension = true;

        let cert = params
            .signed_by(&leaf_key, &self.issuer, &self.key)
            .map_err(|e| CryptoError::CertificateGenerationFailed(e.to_string()))?;

        Ok(IssuedCertificate {
            private_key_pem: private_key_pem.to_string(),
            certificate_pem: cert.pem(),
        })
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority").finish_non_exhaustive()
    }
}

fn load_key_pair(key_pem: &str) -> Result<KeyPair> {
    if key_pem.contains(PKCS1_PEM_LABEL) {
        let rsa_key = RsaPrivateKey::from_pkcs1_pem(key_pem)
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA key: {}", e)))?;
        let pkcs8 = rsa_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA key: {}", e)))?;
        return KeyPair::from_pem(&pkcs8)
            .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA key: {}", e)));
    }

    KeyPair::from_pem(key_pem)
        .map_err(|e| CryptoError::CaUnavailable(format!("invalid CA key: {}", e)))
}

fn distinguished_name(
    common_name: &str,
    organization: &str,
    country: Option<&str>,
) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, organization);
    if let Some(country) = country {
        dn.push(DnType::CountryName, country);
    }
    dn
}

/// Random positive 128-bit serial number
fn random_serial() -> SerialNumber {
    let mut bytes = vec![0u8; SERIAL_NUMBER_SIZE];
    OsRng.fill_bytes(&mut bytes);
    bytes[0] &= 0x7f;
    if bytes[0] == 0 {
        bytes[0] = 0x01;
    }
    SerialNumber::from(bytes)
}
