//! Organization lifecycle.
//!
//! Creating an organization spans two systems: the control-plane registry
//! row and the tenant database. The row is persisted only after the tenant
//! is fully provisioned, and a provisioning failure leaves no trace in
//! either system.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{BooklineError, Result};
use crate::organizations::storage::{OrganizationStore, OwnerStore};
use crate::organizations::types::{NewOrganization, Organization, OrganizationUpdate};
use crate::tenancy::TenantProvisioner;

/// Manages organization creation and updates.
pub struct OrganizationManager {
    organizations: Arc<dyn OrganizationStore>,
    owners: Arc<dyn OwnerStore>,
    provisioner: Arc<TenantProvisioner>,
}

impl OrganizationManager {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        owners: Arc<dyn OwnerStore>,
        provisioner: Arc<TenantProvisioner>,
    ) -> Self {
        Self {
            organizations,
            owners,
            provisioner,
        }
    }

    /// Create an organization and provision its tenant database.
    ///
    /// Order matters: name uniqueness and owner existence are checked
    /// before any database is created, and the registry row is written
    /// only after the tenant is ready. If the final write fails, the
    /// freshly provisioned database is dropped again.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewOrganization) -> Result<Organization> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(BooklineError::validation("Organization name must not be empty"));
        }
        if input.branch_quota == 0 {
            return Err(BooklineError::validation(
                "Branch quota must be greater than 0",
            ));
        }

        if self.organizations.find_by_name(&name).await?.is_some() {
            return Err(BooklineError::conflict(
                "Organization with this name already exists",
            ));
        }

        if !self.owners.exists(input.owner_id).await? {
            return Err(BooklineError::not_found("Owner not found"));
        }

        let ready = self.provisioner.provision(&name).await?;

        let organization = Organization {
            id: Uuid::new_v4(),
            name,
            owner_id: input.owner_id,
            branch_quota: input.branch_quota,
            paid_through: input.paid_through,
            is_active: true,
        };

        if let Err(e) = self.organizations.insert(organization.clone()).await {
            warn!(
                database = %ready.database,
                error = %e,
                "Organization insert failed after provisioning, dropping tenant database"
            );
            if let Err(drop_err) = self.provisioner.deprovision(&ready.database).await {
                warn!(database = %ready.database, error = %drop_err, "Compensating deprovision failed");
            }
            return Err(e);
        }

        info!(
            organization_id = %organization.id,
            database = %ready.database,
            migrations = ready.migrations_applied,
            "Organization created"
        );

        Ok(organization)
    }

    /// Apply a partial update to an organization.
    ///
    /// A name change is re-checked for uniqueness; the tenant database
    /// keeps the name it was provisioned under.
    #[instrument(skip(self, update))]
    pub async fn patch(&self, id: Uuid, update: OrganizationUpdate) -> Result<Organization> {
        let mut organization = self
            .organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Organization not found"))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BooklineError::validation("Organization name must not be empty"));
            }
            if name != organization.name {
                if self.organizations.find_by_name(&name).await?.is_some() {
                    return Err(BooklineError::conflict(
                        "Organization with this name already exists",
                    ));
                }
                organization.name = name;
            }
        }
        if let Some(quota) = update.branch_quota {
            if quota == 0 {
                return Err(BooklineError::validation(
                    "Branch quota must be greater than 0",
                ));
            }
            organization.branch_quota = quota;
        }
        if let Some(paid_through) = update.paid_through {
            organization.paid_through = paid_through;
        }
        if let Some(is_active) = update.is_active {
            organization.is_active = is_active;
        }

        self.organizations.update(organization.clone()).await?;
        Ok(organization)
    }

    /// Deactivate an organization. The tenant database is left in place.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<Organization> {
        self.patch(
            id,
            OrganizationUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Organization> {
        self.organizations
            .find_by_id(id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Organization not found"))
    }

    /// Extend the paid-through date.
    pub async fn extend_paid_through(&self, id: Uuid, until: NaiveDate) -> Result<Organization> {
        self.patch(
            id,
            OrganizationUpdate {
                paid_through: Some(until),
                ..Default::default()
            },
        )
        .await
    }
}
