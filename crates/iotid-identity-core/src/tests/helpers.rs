//! Test helpers for identity core service tests.

use crate::*;
use iotid_crypto::{decode_stream, encode_assertion, Assertion, CertificateAuthority, Ed25519KeyPair};
use iotid_storage::RocksDbStorage;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub type MemoryService = IdentityCoreService<MemoryDataStore>;
pub type RocksService = IdentityCoreService<StorageDataStore<RocksDbStorage>>;

pub const BRAND: &str = "acme";
pub const MODEL: &str = "drone-1000";
pub const SERIAL: &str = "SN-001";
pub const DEVICE_KEY: &str = "KEY-PUB-001";
pub const DEFAULT_ORG: &str = "Default";

/// Fresh self-signed platform CA
pub fn create_test_authority() -> Arc<CertificateAuthority> {
    let (cert_pem, key_pem) = CertificateAuthority::create_self_signed("Test Platform CA").unwrap();
    Arc::new(CertificateAuthority::from_pem(&cert_pem, &key_pem).unwrap())
}

pub fn create_test_config() -> IdentityCoreConfig {
    IdentityCoreConfig {
        mqtt_url: "mqtt.example.com".to_string(),
        mqtt_port: 8883,
        auto_registration_enabled: false,
        default_organization: DEFAULT_ORG.to_string(),
    }
}

/// Service over the in-memory store
pub fn create_memory_service() -> MemoryService {
    create_memory_service_with(KeyAllowlist::empty(), create_test_config())
}

pub fn create_memory_service_with(
    allowlist: KeyAllowlist,
    config: IdentityCoreConfig,
) -> MemoryService {
    IdentityCoreService::new(
        Arc::new(MemoryDataStore::new()),
        create_test_authority(),
        allowlist,
        config,
    )
}

/// Service over RocksDB in a temporary directory
pub fn create_rocks_service() -> (RocksService, TempDir) {
    create_rocks_service_with(KeyAllowlist::empty(), create_test_config())
}

pub fn create_rocks_service_with(
    allowlist: KeyAllowlist,
    config: IdentityCoreConfig,
) -> (RocksService, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(RocksDbStorage::open(temp_dir.path()).unwrap());
    let service = IdentityCoreService::new(
        Arc::new(StorageDataStore::new(storage)),
        create_test_authority(),
        allowlist,
        config,
    );
    (service, temp_dir)
}

/// Config with auto-registration into [`DEFAULT_ORG`] turned on
pub fn auto_registration_config() -> IdentityCoreConfig {
    IdentityCoreConfig {
        auto_registration_enabled: true,
        ..create_test_config()
    }
}

/// Service with auto-registration on, trusting `signer`
pub fn create_auto_registration_service(signer: &Ed25519KeyPair) -> MemoryService {
    create_memory_service_with(
        KeyAllowlist::from_keys([signer.account_public_key()]),
        auto_registration_config(),
    )
}

/// Register an organization plus a device in `Waiting`
pub async fn create_test_device<D: DataStore + ?Sized + 'static>(
    service: &IdentityCoreService<D>,
) -> (Uuid, Uuid) {
    let organization_id = service.register_organization("Acme", "GB").await.unwrap();
    let device_id = service
        .register_device(register_request(&organization_id.to_string(), SERIAL))
        .await
        .unwrap();
    (organization_id, device_id)
}

pub fn register_request(organization: &str, serial: &str) -> RegisterDeviceRequest {
    RegisterDeviceRequest {
        organization: organization.to_string(),
        brand: BRAND.to_string(),
        model: MODEL.to_string(),
        serial_number: serial.to_string(),
        device_data: String::new(),
    }
}

pub fn model_assertion(signer: &Ed25519KeyPair) -> Assertion {
    signed_assertion(
        &[
            ("type", "model"),
            ("brand-id", BRAND),
            ("model", MODEL),
            ("store", "store-eu"),
        ],
        signer,
    )
}

pub fn serial_assertion(signer: &Ed25519KeyPair, serial: &str) -> Assertion {
    signed_assertion(
        &[
            ("type", "serial"),
            ("brand-id", BRAND),
            ("model", MODEL),
            ("serial", serial),
            ("device-key", DEVICE_KEY),
        ],
        signer,
    )
}

pub fn signed_assertion(headers: &[(&str, &str)], signer: &Ed25519KeyPair) -> Assertion {
    let encoded = encode_assertion(headers, b"", signer).unwrap();
    decode_stream(&encoded).unwrap().remove(0)
}

/// Enrollment request body: model then serial, blank line between
pub fn enrollment_body(signer: &Ed25519KeyPair, serial: &str) -> Vec<u8> {
    let mut body = encode_assertion(
        &[
            ("type", "model"),
            ("brand-id", BRAND),
            ("model", MODEL),
        ],
        b"",
        signer,
    )
    .unwrap();
    body.extend_from_slice(b"\n\n");
    body.extend(
        encode_assertion(
            &[
                ("type", "serial"),
                ("brand-id", BRAND),
                ("model", MODEL),
                ("serial", serial),
                ("device-key", DEVICE_KEY),
            ],
            b"",
            signer,
        )
        .unwrap(),
    );
    body
}
