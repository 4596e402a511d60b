//! Router tests for the admin and enrollment APIs.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use iotid_crypto::{encode_assertion, CertificateAuthority, Ed25519KeyPair, ASSERTION_MEDIA_TYPE};
use iotid_identity_core::{KeyAllowlist, MemoryDataStore};
use iotid_server::{
    config::{AuthProvider, Config},
    create_admin_router, create_enroll_router,
    state::AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.mqtt_host = "mqtt.example.com".to_string();
    config.default_organization = "Acme".to_string();
    config
}

fn test_state(config: Config, allowlist: KeyAllowlist) -> Arc<AppState> {
    let (cert_pem, key_pem) = CertificateAuthority::create_self_signed("Test Platform CA").unwrap();
    let authority = Arc::new(CertificateAuthority::from_pem(&cert_pem, &key_pem).unwrap());
    Arc::new(AppState::with_parts(
        config,
        Arc::new(MemoryDataStore::new()),
        authority,
        allowlist,
    ))
}

fn test_apps() -> (Router, Router) {
    let state = test_state(test_config(), KeyAllowlist::empty());
    (create_admin_router(Arc::clone(&state)), create_enroll_router(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn enroll_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/device/enroll")
        .header("Content-Type", ASSERTION_MEDIA_TYPE)
        .body(Body::from(body))
        .unwrap()
}

fn assertions(signer: &Ed25519KeyPair, brand_in_serial: &str, serial: &str) -> Vec<u8> {
    let mut body = encode_assertion(
        &[
            ("type", "model"),
            ("brand-id", "acme"),
            ("model", "drone-1000"),
            ("store", "acme-store"),
        ],
        b"",
        signer,
    )
    .unwrap();
    body.extend(
        encode_assertion(
            &[
                ("type", "serial"),
                ("brand-id", brand_in_serial),
                ("model", "drone-1000"),
                ("serial", serial),
                ("device-key", "KEY-PUB-001"),
            ],
            b"",
            signer,
        )
        .unwrap(),
    );
    body
}

/// Create organization Acme with device SN-001, returning their ids
async fn seed(admin: &Router) -> (String, String) {
    let (status, body) = send(
        admin,
        json_request("POST", "/v1/organization", json!({"name": "Acme", "countryName": "US"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let organization_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        admin,
        json_request(
            "POST",
            "/v1/device",
            json!({
                "organizationId": organization_id,
                "brand": "acme",
                "model": "drone-1000",
                "serialNumber": "SN-001",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let device_id = body["id"].as_str().unwrap().to_string();

    (organization_id, device_id)
}

// ==================== Health ====================

#[tokio::test]
async fn test_health_endpoints() {
    let (admin, enroll) = test_apps();

    for app in [&admin, &enroll] {
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = send(app, get("/ready")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }
}

#[tokio::test]
async fn test_request_id_echoed() {
    let (admin, _) = test_apps();

    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = admin.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["X-Request-ID"], "req-123");
}

// ==================== Organizations ====================

#[tokio::test]
async fn test_organization_endpoints() {
    let (admin, _) = test_apps();
    let (organization_id, _) = seed(&admin).await;

    let (status, body) = send(&admin, get("/v1/organizations")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organizations"].as_array().unwrap().len(), 1);

    let (status, body) = send(&admin, get("/v1/organization/Acme")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], organization_id);
    assert_eq!(body["countryName"], "US");
    assert!(body["rootCert"].as_str().unwrap().contains("BEGIN CERTIFICATE"));
    assert!(body.get("rootKey").is_none());
}

#[tokio::test]
async fn test_duplicate_organization() {
    let (admin, _) = test_apps();
    seed(&admin).await;

    let (status, body) = send(
        &admin,
        json_request("POST", "/v1/organization", json!({"name": "Acme"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_malformed_json() {
    let (admin, _) = test_apps();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/organization")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&admin, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

// ==================== Devices ====================

#[tokio::test]
async fn test_device_list_omits_private_key() {
    let (admin, _) = test_apps();
    let (_, device_id) = seed(&admin).await;

    let (status, body) = send(&admin, get("/v1/devices/Acme")).await;
    assert_eq!(status, StatusCode::OK);
    let devices = body["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["id"], device_id);
    assert_eq!(devices[0]["status"], 1);
    assert!(devices[0]["credentials"].get("privateKey").is_none());

    let (status, body) = send(&admin, get("/v1/devices/Acme/SN-001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device"]["serialNumber"], "SN-001");
    assert_eq!(body["credentials"]["mqttUrl"], "mqtt.example.com");
    assert!(body["credentials"]["privateKey"]
        .as_str()
        .unwrap()
        .contains("PRIVATE KEY"));
}

#[tokio::test]
async fn test_update_device_status() {
    let (admin, _) = test_apps();
    seed(&admin).await;

    let (status, _) = send(
        &admin,
        json_request(
            "PUT",
            "/v1/devices/Acme/SN-001",
            json!({"status": 3, "deviceData": "rack 4"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&admin, get("/v1/devices/Acme/SN-001")).await;
    assert_eq!(body["status"], 3);
    assert_eq!(body["deviceData"], "rack 4");

    let (status, body) = send(
        &admin,
        json_request("PUT", "/v1/devices/Acme/SN-001", json!({"status": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = send(
        &admin,
        json_request("PUT", "/v1/devices/Acme/SN-001", json!({"status": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_delete_device() {
    let (admin, _) = test_apps();
    let (_, device_id) = seed(&admin).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/device/{}", device_id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&admin, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], device_id);

    let (status, body) = send(&admin, get("/v1/devices/Acme/SN-001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ==================== Enrollment ====================

#[tokio::test]
async fn test_enroll_device() {
    let (admin, enroll) = test_apps();
    let (organization_id, device_id) = seed(&admin).await;
    let signer = Ed25519KeyPair::generate();

    let (status, body) = send(&enroll, enroll_request(assertions(&signer, "acme", "SN-001"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], device_id);
    assert_eq!(body["status"], 2);
    assert_eq!(body["device"]["deviceKey"], "KEY-PUB-001");
    assert_eq!(body["device"]["storeId"], "acme-store");
    assert_eq!(body["organization"]["id"], organization_id);
    assert_eq!(body["organization"]["name"], "Acme");
    assert!(body["organization"].get("rootKey").is_none());
    assert!(body["credentials"]["certificate"]
        .as_str()
        .unwrap()
        .contains("BEGIN CERTIFICATE"));

    let (status, body) = send(&enroll, enroll_request(assertions(&signer, "acme", "SN-001"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_ENROLLED");
}

#[tokio::test]
async fn test_enroll_mismatched_assertions() {
    let (admin, enroll) = test_apps();
    seed(&admin).await;
    let signer = Ed25519KeyPair::generate();

    let (status, body) = send(&enroll, enroll_request(assertions(&signer, "other", "SN-001"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (_, body) = send(&admin, get("/v1/devices/Acme/SN-001")).await;
    assert_eq!(body["status"], 1);
}

#[tokio::test]
async fn test_enroll_requires_assertion_content_type() {
    let (_, enroll) = test_apps();
    let signer = Ed25519KeyPair::generate();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/device/enroll")
        .header("Content-Type", "application/json")
        .body(Body::from(assertions(&signer, "acme", "SN-001")))
        .unwrap();
    let (status, _) = send(&enroll, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enroll_auto_registration() {
    let trusted = Ed25519KeyPair::generate();
    let mut config = test_config();
    config.auto_registration_enabled = true;
    let state = test_state(config, KeyAllowlist::from_keys([trusted.account_public_key()]));
    let admin = create_admin_router(Arc::clone(&state));
    let enroll = create_enroll_router(state);

    send(&admin, json_request("POST", "/v1/organization", json!({"name": "Acme"}))).await;

    let untrusted = Ed25519KeyPair::generate();
    let (status, body) = send(&enroll, enroll_request(assertions(&untrusted, "acme", "SN-777"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ELIGIBLE");

    let (status, body) = send(&enroll, enroll_request(assertions(&trusted, "acme", "SN-777"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 2);
    assert_eq!(body["organization"]["name"], "Acme");

    let (_, body) = send(&admin, get("/v1/devices/Acme")).await;
    assert_eq!(body["devices"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_enroll_router_has_no_admin_routes() {
    let (_, enroll) = test_apps();

    let (status, _) = send(&enroll, get("/v1/organizations")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== Auth ====================

#[tokio::test]
async fn test_static_client_auth() {
    let mut config = test_config();
    config.auth_provider = AuthProvider::StaticClient {
        secret: "s3cret".to_string(),
    };
    let state = test_state(config, KeyAllowlist::empty());
    let admin = create_admin_router(Arc::clone(&state));
    let enroll = create_enroll_router(state);

    let (status, body) = send(&admin, get("/v1/organizations")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let request = Request::builder()
        .uri("/v1/organizations")
        .header("Authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&admin, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/organizations")
        .header("Authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&admin, request).await;
    assert_eq!(status, StatusCode::OK);

    // Health stays open, and devices never need the admin secret.
    let (status, _) = send(&admin, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let signer = Ed25519KeyPair::generate();
    let (status, _) = send(&enroll, enroll_request(assertions(&signer, "acme", "SN-001"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
