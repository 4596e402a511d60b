//! Device registration, lookup, status updates, and deletion.

use super::helpers::*;
use crate::service::next_status;
use crate::*;
use uuid::Uuid;
use x509_parser::pem::parse_x509_pem;

#[tokio::test]
async fn test_register_device() {
    let service = create_memory_service();
    let (organization_id, device_id) = create_test_device(&service).await;

    let device = service
        .get_device(&organization_id.to_string(), &device_id.to_string())
        .await
        .unwrap();

    assert_eq!(device.id, device_id);
    assert_eq!(device.organization_id, organization_id);
    assert_eq!(device.status, DeviceStatus::Waiting);
    assert_eq!(device.device.brand, BRAND);
    assert_eq!(device.device.serial_number, SERIAL);
    assert!(device.device.device_key.is_empty());
    assert_eq!(device.credentials.mqtt_url, "mqtt.example.com");
    assert_eq!(device.credentials.mqtt_port, 8883);
    assert!(device.credentials.private_key.contains("BEGIN RSA PRIVATE KEY"));
}

#[tokio::test]
async fn test_device_certificate_names_device_and_organization() {
    let service = create_memory_service();
    let (_, device_id) = create_test_device(&service).await;

    let device = service.get_device("Acme", SERIAL).await.unwrap();
    let (_, pem) = parse_x509_pem(device.credentials.certificate.as_bytes()).unwrap();
    let cert = pem.parse_x509().unwrap();

    let common_name = cert.subject().iter_common_name().next().unwrap().as_str().unwrap();
    let organization = cert
        .subject()
        .iter_organization()
        .next()
        .unwrap()
        .as_str()
        .unwrap();
    assert_eq!(common_name, device_id.to_string());
    assert_eq!(organization, "Acme");
}

#[tokio::test]
async fn test_register_device_by_organization_name() {
    let service = create_memory_service();
    let organization_id = service.register_organization("Acme", "").await.unwrap();

    let device_id = service
        .register_device(register_request("Acme", SERIAL))
        .await
        .unwrap();

    let device = service.get_device("Acme", &device_id.to_string()).await.unwrap();
    assert_eq!(device.organization_id, organization_id);
}

#[tokio::test]
async fn test_register_device_unknown_organization() {
    let service = create_memory_service();

    let err = service
        .register_device(register_request(&Uuid::now_v7().to_string(), SERIAL))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityCoreError::NotFound(_)));
}

#[tokio::test]
async fn test_register_device_requires_fields() {
    let service = create_memory_service();
    service.register_organization("Acme", "").await.unwrap();

    let mut request = register_request("Acme", SERIAL);
    request.model = String::new();

    let err = service.register_device(request).await.unwrap_err();
    assert!(matches!(err, IdentityCoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_duplicate_device_natural_key() {
    let (service, _temp_dir) = create_rocks_service();
    let (organization_id, _) = create_test_device(&service).await;

    let err = service
        .register_device(register_request(&organization_id.to_string(), SERIAL))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityCoreError::Conflict(_)));

    let devices = service.list_devices("Acme").await.unwrap();
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_same_serial_different_model_is_allowed() {
    let service = create_memory_service();
    create_test_device(&service).await;

    let mut request = register_request("Acme", SERIAL);
    request.model = "drone-2000".to_string();
    service.register_device(request).await.unwrap();

    assert_eq!(service.list_devices("Acme").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_devices_scoped_to_organization() {
    let service = create_memory_service();
    create_test_device(&service).await;
    service.register_organization("Other", "").await.unwrap();
    service
        .register_device(register_request("Other", "SN-900"))
        .await
        .unwrap();

    let acme = service.list_devices("Acme").await.unwrap();
    assert_eq!(acme.len(), 1);
    assert_eq!(acme[0].device.serial_number, SERIAL);

    let err = service.list_devices("Nobody").await.unwrap_err();
    assert!(matches!(err, IdentityCoreError::NotFound(_)));
}

#[tokio::test]
async fn test_get_device_from_other_organization() {
    let service = create_memory_service();
    let (_, device_id) = create_test_device(&service).await;
    service.register_organization("Other", "").await.unwrap();

    let err = service
        .get_device("Other", &device_id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityCoreError::NotFound(_)));
}

#[tokio::test]
async fn test_disable_and_reset_device() {
    let (service, _temp_dir) = create_rocks_service();
    create_test_device(&service).await;

    service
        .update_device_status(
            "Acme",
            SERIAL,
            DeviceUpdate {
                status: Some(DeviceStatus::Disabled),
                device_data: None,
            },
        )
        .await
        .unwrap();
    let device = service.get_device("Acme", SERIAL).await.unwrap();
    assert_eq!(device.status, DeviceStatus::Disabled);

    service
        .update_device_status(
            "Acme",
            SERIAL,
            DeviceUpdate {
                status: Some(DeviceStatus::Waiting),
                device_data: Some("{\"site\":\"lab\"}".to_string()),
            },
        )
        .await
        .unwrap();
    let device = service.get_device("Acme", SERIAL).await.unwrap();
    assert_eq!(device.status, DeviceStatus::Waiting);
    assert_eq!(device.device_data, "{\"site\":\"lab\"}");
}

#[tokio::test]
async fn test_update_to_enrolled_rejected() {
    let service = create_memory_service();
    create_test_device(&service).await;

    let err = service
        .update_device_status(
            "Acme",
            SERIAL,
            DeviceUpdate {
                status: Some(DeviceStatus::Enrolled),
                device_data: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityCoreError::InvalidTransition { .. }));

    let device = service.get_device("Acme", SERIAL).await.unwrap();
    assert_eq!(device.status, DeviceStatus::Waiting);
}

#[tokio::test]
async fn test_empty_update_rejected() {
    let service = create_memory_service();
    create_test_device(&service).await;

    let err = service
        .update_device_status("Acme", SERIAL, DeviceUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityCoreError::InvalidInput(_)));
}

#[test]
fn test_status_transitions() {
    use DeviceStatus::*;

    assert_eq!(next_status(Waiting, Waiting).unwrap(), None);
    assert_eq!(next_status(Waiting, Disabled).unwrap(), Some(Disabled));
    assert_eq!(next_status(Enrolled, Waiting).unwrap(), Some(Waiting));
    assert_eq!(next_status(Enrolled, Disabled).unwrap(), Some(Disabled));
    assert_eq!(next_status(Disabled, Waiting).unwrap(), Some(Waiting));
    assert_eq!(next_status(Disabled, Disabled).unwrap(), None);

    for current in [Waiting, Enrolled, Disabled] {
        assert!(matches!(
            next_status(current, Enrolled),
            Err(IdentityCoreError::InvalidTransition { .. })
        ));
    }
}

#[tokio::test]
async fn test_delete_device() {
    let service = create_memory_service();
    let (_, device_id) = create_test_device(&service).await;

    assert_eq!(service.delete_device(device_id).await.unwrap(), device_id);
    assert!(service.list_devices("Acme").await.unwrap().is_empty());

    let err = service.delete_device(device_id).await.unwrap_err();
    assert!(matches!(err, IdentityCoreError::NotFound(_)));

    // The natural key is free again.
    service
        .register_device(register_request("Acme", SERIAL))
        .await
        .unwrap();
}
