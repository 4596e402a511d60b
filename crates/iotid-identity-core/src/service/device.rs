//! Device operations: register, status updates, lookups, delete.

use crate::{
    datastore::{DataStore, DataStoreError},
    errors::*,
    types::*,
};
use iotid_crypto::hash_for_log;
use tracing::info;
use uuid::Uuid;

use super::{require, IdentityCoreService};

impl<D: DataStore + ?Sized> IdentityCoreService<D> {
    /// Register a device in `Waiting` and mint its client certificate
    pub(crate) async fn register_device_internal(
        &self,
        request: RegisterDeviceRequest,
    ) -> Result<Uuid> {
        let brand = require("brand", &request.brand)?;
        let model = require("model", &request.model)?;
        let serial = require("serialNumber", &request.serial_number)?;
        let organization = self.resolve_organization(&request.organization).await?;

        match self.store.device_get(brand, model, serial).await {
            Ok(_) => {
                return Err(IdentityCoreError::Conflict(format!(
                    "device {}/{} with this serial number already exists",
                    brand, model
                )))
            }
            Err(DataStoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let device_id = Uuid::now_v7();
        let issued = self
            .authority
            .issue_client_certificate(&organization.name, &device_id.to_string())
            .await?;

        let enrollment = Enrollment {
            id: device_id,
            organization_id: organization.id,
            device: Device {
                brand: brand.to_string(),
                model: model.to_string(),
                serial_number: serial.to_string(),
                ..Default::default()
            },
            credentials: Credentials {
                private_key: issued.private_key_pem,
                certificate: issued.certificate_pem,
                mqtt_url: self.config.mqtt_url.clone(),
                mqtt_port: self.config.mqtt_port,
            },
            status: DeviceStatus::Waiting,
            device_data: request.device_data,
            created_at: current_timestamp(),
        };
        self.store.device_new(enrollment).await?;

        info!(
            device_id = %device_id,
            organization_id = %organization.id,
            brand = %brand,
            model = %model,
            serial = %hash_for_log(serial),
            "Device registered"
        );
        Ok(device_id)
    }

    /// Device of the given organization
    pub(crate) async fn get_device_internal(
        &self,
        org_ref: &str,
        device_ref: &str,
    ) -> Result<Enrollment> {
        let organization = self.resolve_organization(org_ref).await?;
        let device_ref = require("device", device_ref)?;

        let enrollment = self.store.device_get_by_ref(device_ref).await?;
        if enrollment.organization_id != organization.id {
            return Err(IdentityCoreError::NotFound(format!(
                "device {} not found in organization {}",
                device_ref, organization.name
            )));
        }
        Ok(enrollment)
    }

    pub(crate) async fn list_devices_internal(&self, org_ref: &str) -> Result<Vec<Enrollment>> {
        let org_ref = require("organization", org_ref)?;
        Ok(self.store.device_list(org_ref).await?)
    }

    /// Apply an administrative status change and/or device data update
    pub(crate) async fn update_device_status_internal(
        &self,
        org_ref: &str,
        device_ref: &str,
        update: DeviceUpdate,
    ) -> Result<()> {
        if update.is_empty() {
            return Err(IdentityCoreError::InvalidInput(
                "status or deviceData is required".to_string(),
            ));
        }

        let enrollment = self.get_device_internal(org_ref, device_ref).await?;

        let status = match update.status {
            Some(requested) => next_status(enrollment.status, requested)?,
            None => None,
        };
        let device_data = update
            .device_data
            .filter(|data| *data != enrollment.device_data);

        let effective = DeviceUpdate {
            status,
            device_data,
        };
        if effective.is_empty() {
            return Ok(());
        }

        self.store
            .device_update(&enrollment.id.to_string(), effective.clone())
            .await?;

        info!(
            device_id = %enrollment.id,
            from = %enrollment.status,
            to = %effective.status.unwrap_or(enrollment.status),
            "Device updated"
        );
        Ok(())
    }

    pub(crate) async fn delete_device_internal(&self, device_id: Uuid) -> Result<Uuid> {
        let deleted = self.store.device_delete(device_id).await?;
        info!(device_id = %deleted, "Device deleted");
        Ok(deleted)
    }
}

/// Administrative status transition.
///
/// `Waiting` and `Disabled` may be requested from any state; `Enrolled` is
/// only ever reached through enrollment. Returns `None` when the device is
/// already in the requested state.
pub(crate) fn next_status(
    current: DeviceStatus,
    requested: DeviceStatus,
) -> Result<Option<DeviceStatus>> {
    match requested {
        DeviceStatus::Enrolled => Err(IdentityCoreError::InvalidTransition {
            from: current,
            to: requested,
        }),
        _ if requested == current => Ok(None),
        _ => Ok(Some(requested)),
    }
}
