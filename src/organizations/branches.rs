//! Branch lifecycle.
//!
//! Branch creation is quota-gated: an organization whose branch count has
//! reached its quota cannot add another. The branch registry is the
//! canonical source of truth that staff membership snapshots are validated
//! against.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{BooklineError, Result};
use crate::organizations::storage::{BranchStore, OrganizationStore};
use crate::organizations::types::{Branch, BranchUpdate, NewBranch};

/// Manages branches of an organization.
pub struct BranchManager {
    branches: Arc<dyn BranchStore>,
    organizations: Arc<dyn OrganizationStore>,
}

impl BranchManager {
    pub fn new(branches: Arc<dyn BranchStore>, organizations: Arc<dyn OrganizationStore>) -> Self {
        Self {
            branches,
            organizations,
        }
    }

    /// Create a branch, enforcing the organization's branch quota.
    #[instrument(skip(self, input), fields(organization_id = %input.organization_id))]
    pub async fn create(&self, input: NewBranch) -> Result<Branch> {
        if input.name.trim().is_empty() {
            return Err(BooklineError::validation("Branch name must not be empty"));
        }

        let organization = self
            .organizations
            .find_by_id(input.organization_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Organization not found"))?;

        if !organization.is_active {
            return Err(BooklineError::validation("Organization is deactivated"));
        }

        let count = self
            .branches
            .count_by_organization(organization.id)
            .await?;
        // Strict: count must be below the quota before creating
        if count >= organization.branch_quota {
            return Err(BooklineError::conflict(format!(
                "Organization can have only {} branches",
                organization.branch_quota
            )));
        }

        let branch = Branch {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            name: input.name.trim().to_string(),
            phone: input.phone,
            address: input.address,
            timezone: input.timezone,
            is_active: true,
        };

        self.branches.insert(branch.clone()).await?;
        info!(branch_id = %branch.id, "Branch created");
        Ok(branch)
    }

    /// Apply a partial update to a branch.
    #[instrument(skip(self, update))]
    pub async fn patch(&self, id: Uuid, update: BranchUpdate) -> Result<Branch> {
        let mut branch = self
            .branches
            .find_by_id(id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Branch not found"))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(BooklineError::validation("Branch name must not be empty"));
            }
            branch.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            branch.phone = phone;
        }
        if let Some(address) = update.address {
            branch.address = address;
        }
        if let Some(timezone) = update.timezone {
            branch.timezone = timezone;
        }
        if let Some(is_active) = update.is_active {
            branch.is_active = is_active;
        }

        self.branches.update(branch.clone()).await?;
        Ok(branch)
    }

    /// Deactivate a branch. Existing staff memberships are untouched; the
    /// branch simply stops accepting new activity.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<Branch> {
        self.patch(
            id,
            BranchUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Branch> {
        self.branches
            .find_by_id(id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Branch not found"))
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Branch>> {
        self.branches.list_by_organization(organization_id).await
    }
}
