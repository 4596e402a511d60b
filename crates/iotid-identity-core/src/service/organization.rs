//! Organization operations: register, resolve.

use crate::{
    datastore::{DataStore, DataStoreError},
    errors::*,
    types::*,
};
use tracing::info;
use uuid::Uuid;

use super::{require, IdentityCoreService};

impl<D: DataStore + ?Sized> IdentityCoreService<D> {
    /// Create an organization with a freshly issued server certificate
    pub(crate) async fn register_organization_internal(
        &self,
        name: &str,
        country_name: &str,
    ) -> Result<Uuid> {
        let name = require("name", name)?;

        match self.store.organization_get_by_name(name).await {
            Ok(_) => {
                return Err(IdentityCoreError::Conflict(format!(
                    "organization '{}' already exists",
                    name
                )))
            }
            Err(DataStoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let issued = self
            .authority
            .issue_server_certificate(name, country_name)
            .await?;

        let organization_id = self
            .store
            .organization_new(NewOrganization {
                name: name.to_string(),
                country_name: country_name.to_string(),
                server_key: issued.private_key_pem,
                server_cert: issued.certificate_pem,
            })
            .await?;

        info!(organization_id = %organization_id, name = %name, "Organization registered");
        Ok(organization_id)
    }

    /// Resolve an organization by id, falling back to name
    pub(crate) async fn resolve_organization(&self, org_ref: &str) -> Result<Organization> {
        let org_ref = require("organization", org_ref)?;

        if let Ok(id) = Uuid::parse_str(org_ref) {
            match self.store.organization_get(id).await {
                Ok(organization) => return Ok(organization),
                Err(DataStoreError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(self.store.organization_get_by_name(org_ref).await?)
    }
}
