//! Persistence traits for the control-plane registries.
//!
//! Name and id uniqueness is delegated to the backing store; managers treat
//! a `Conflict` from an insert as authoritative.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::organizations::types::{Branch, Organization};

/// Storage backend for organization rows.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>>;

    /// Find by exact name; used for the pre-provisioning uniqueness check.
    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>>;

    /// Insert a new organization.
    ///
    /// Returns `Conflict` if the name is already taken.
    async fn insert(&self, organization: Organization) -> Result<()>;

    /// Replace an existing organization row.
    async fn update(&self, organization: Organization) -> Result<()>;
}

/// Storage backend for branch rows.
#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>>;

    async fn insert(&self, branch: Branch) -> Result<()>;

    async fn update(&self, branch: Branch) -> Result<()>;

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<Branch>>;

    /// Current branch count of an organization, for the quota check.
    async fn count_by_organization(&self, organization_id: Uuid) -> Result<u32>;
}

/// Lookup for platform owner accounts.
///
/// Owners live in a separate identity system; creating an organization only
/// needs to know the referenced owner exists.
#[async_trait]
pub trait OwnerStore: Send + Sync {
    async fn exists(&self, owner_id: Uuid) -> Result<bool>;
}
