//! Canonical organization and branch records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization (tenant) on the platform.
///
/// Organizations are never hard-deleted; `is_active` is flipped instead so
/// the tenant database and all references stay intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// Globally unique; also the basis of the tenant database name
    pub name: String,
    pub owner_id: Uuid,
    /// Maximum number of branches this organization may have (strict)
    pub branch_quota: u32,
    pub paid_through: NaiveDate,
    pub is_active: bool,
}

/// A physical location of an organization.
///
/// The canonical source of truth for branch data; staff records only carry
/// validated projections of these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub timezone: String,
    pub is_active: bool,
}

/// Input for creating an organization.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub owner_id: Uuid,
    pub branch_quota: u32,
    pub paid_through: NaiveDate,
}

/// Partial update to an organization. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub branch_quota: Option<u32>,
    pub paid_through: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Input for creating a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBranch {
    pub organization_id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub timezone: String,
}

/// Partial update to a branch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}
