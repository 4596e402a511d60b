//! Device enrollment from model and serial assertions.
//!
//! A known device in `Waiting` is enrolled directly. An unknown device is
//! registered into the default organization first, but only when
//! auto-registration is enabled and both assertions are signed by
//! allow-listed keys.

use crate::{
    datastore::{DataStore, DataStoreError},
    errors::*,
    types::*,
};
use iotid_crypto::{assertion_types, decode_stream, hash_for_log, headers, verify_assertion, Assertion};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::IdentityCoreService;

/// Split an enrollment request body into `(model, serial)` assertions.
///
/// The body must hold exactly two assertions, in either order.
pub fn split_enrollment_assertions(stream: &[u8]) -> Result<(Assertion, Assertion)> {
    let mut assertions =
        decode_stream(stream).map_err(|e| IdentityCoreError::InvalidInput(e.to_string()))?;

    if assertions.len() != 2 {
        return Err(IdentityCoreError::InvalidInput(format!(
            "expected a model and a serial assertion, got {} assertions",
            assertions.len()
        )));
    }

    let second = assertions.remove(1);
    let first = assertions.remove(0);
    if first.type_name() == assertion_types::SERIAL && second.type_name() == assertion_types::MODEL
    {
        Ok((second, first))
    } else {
        Ok((first, second))
    }
}

/// Values extracted from a validated model/serial pair
struct EnrollmentClaim<'a> {
    brand: &'a str,
    model: &'a str,
    serial: &'a str,
    device_key: &'a str,
    store_id: &'a str,
}

impl<'a> EnrollmentClaim<'a> {
    fn from_assertions(model: &'a Assertion, serial: &'a Assertion) -> Result<Self> {
        if model.type_name() != assertion_types::MODEL {
            return Err(IdentityCoreError::InvalidInput(format!(
                "expected a model assertion, got '{}'",
                model.type_name()
            )));
        }
        if serial.type_name() != assertion_types::SERIAL {
            return Err(IdentityCoreError::InvalidInput(format!(
                "expected a serial assertion, got '{}'",
                serial.type_name()
            )));
        }

        for name in [headers::BRAND_ID, headers::MODEL] {
            if model.header(name) != serial.header(name) {
                return Err(IdentityCoreError::InvalidInput(format!(
                    "model and serial assertions disagree on '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            brand: required_header(model, headers::BRAND_ID)?,
            model: required_header(model, headers::MODEL)?,
            serial: required_header(serial, headers::SERIAL)?,
            device_key: required_header(serial, headers::DEVICE_KEY)?,
            store_id: model.header(headers::STORE).unwrap_or_default(),
        })
    }
}

impl<D: DataStore + ?Sized> IdentityCoreService<D> {
    /// Enroll a device, auto-registering it when allowed
    pub(crate) async fn enroll_device_internal(
        &self,
        model: &Assertion,
        serial: &Assertion,
    ) -> Result<EnrolledDevice> {
        let claim = EnrollmentClaim::from_assertions(model, serial)?;

        let organization_id = match self
            .store
            .device_get(claim.brand, claim.model, claim.serial)
            .await
        {
            Ok(existing) => {
                ensure_enrollable(&existing)?;
                existing.organization_id
            }
            Err(DataStoreError::NotFound { .. }) => {
                self.auto_register(&claim, model, serial).await?
            }
            Err(e) => return Err(e.into()),
        };
        let organization = self.store.organization_get(organization_id).await?;

        let result = self
            .store
            .device_enroll(
                claim.brand,
                claim.model,
                claim.serial,
                claim.store_id,
                claim.device_key,
            )
            .await;

        match result {
            Ok(enrollment) => {
                info!(
                    device_id = %enrollment.id,
                    organization_id = %enrollment.organization_id,
                    serial = %hash_for_log(claim.serial),
                    "Device enrolled"
                );
                Ok(EnrolledDevice {
                    enrollment,
                    organization,
                })
            }
            Err(DataStoreError::Conflict(_)) => {
                // Lost a race with another enrollment or status change.
                let current = self
                    .store
                    .device_get(claim.brand, claim.model, claim.serial)
                    .await?;
                ensure_enrollable(&current)?;
                Err(IdentityCoreError::InvalidState(format!(
                    "device {} could not be enrolled",
                    current.id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register an unknown device into the default organization.
    ///
    /// Returns the organization the device ended up in.
    async fn auto_register(
        &self,
        claim: &EnrollmentClaim<'_>,
        model: &Assertion,
        serial: &Assertion,
    ) -> Result<Uuid> {
        if !self.config.auto_registration_enabled {
            warn!(
                serial = %hash_for_log(claim.serial),
                "Enrollment rejected: device not registered"
            );
            return Err(IdentityCoreError::NotFound(format!(
                "device {}/{} is not registered",
                claim.brand, claim.model
            )));
        }

        for assertion in [model, serial] {
            if let Err(e) = self.check_eligible(assertion) {
                warn!(
                    serial = %hash_for_log(claim.serial),
                    error = %e,
                    "Auto-registration rejected"
                );
                return Err(e);
            }
        }

        let organization = self.default_organization().await?;
        let request = RegisterDeviceRequest {
            organization: organization.id.to_string(),
            brand: claim.brand.to_string(),
            model: claim.model.to_string(),
            serial_number: claim.serial.to_string(),
            device_data: String::new(),
        };

        match self.register_device_internal(request).await {
            Ok(device_id) => {
                info!(
                    device_id = %device_id,
                    organization = %organization.name,
                    "Device auto-registered"
                );
                Ok(organization.id)
            }
            Err(IdentityCoreError::Conflict(_)) => {
                debug!(
                    serial = %hash_for_log(claim.serial),
                    "Device registered concurrently"
                );
                let existing = self
                    .store
                    .device_get(claim.brand, claim.model, claim.serial)
                    .await?;
                Ok(existing.organization_id)
            }
            Err(e) => Err(e),
        }
    }

    /// Assertion must be signed by an allow-listed key
    fn check_eligible(&self, assertion: &Assertion) -> Result<()> {
        let key_id = assertion.sign_key_id().ok_or_else(|| {
            IdentityCoreError::NotEligible(format!(
                "{} assertion names no signing key",
                assertion.type_name()
            ))
        })?;
        let key = self.allowlist.lookup(key_id)?;

        verify_assertion(assertion, key).map_err(|e| {
            IdentityCoreError::NotEligible(format!("{} assertion: {}", assertion.type_name(), e))
        })
    }

    async fn default_organization(&self) -> Result<Organization> {
        let name = &self.config.default_organization;
        if name.is_empty() {
            return Err(IdentityCoreError::Config(
                "no default organization configured".to_string(),
            ));
        }

        self.store
            .organization_list()
            .await?
            .into_iter()
            .find(|organization| &organization.name == name)
            .ok_or_else(|| {
                IdentityCoreError::Config(format!("default organization '{}' does not exist", name))
            })
    }
}

fn required_header<'a>(assertion: &'a Assertion, name: &str) -> Result<&'a str> {
    match assertion.header(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(IdentityCoreError::InvalidInput(format!(
            "{} assertion is missing '{}'",
            assertion.type_name(),
            name
        ))),
    }
}

fn ensure_enrollable(enrollment: &Enrollment) -> Result<()> {
    match enrollment.status {
        DeviceStatus::Waiting => Ok(()),
        DeviceStatus::Enrolled => Err(IdentityCoreError::AlreadyEnrolled(enrollment.id.to_string())),
        DeviceStatus::Disabled => Err(IdentityCoreError::Disabled(enrollment.id.to_string())),
    }
}
