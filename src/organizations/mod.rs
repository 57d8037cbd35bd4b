//! Canonical organization and branch registries.

pub mod branches;
pub mod manager;
pub mod storage;
pub mod types;

pub use branches::BranchManager;
pub use manager::OrganizationManager;
pub use storage::{BranchStore, OrganizationStore, OwnerStore};
pub use types::{
    Branch, BranchUpdate, NewBranch, NewOrganization, Organization, OrganizationUpdate,
};
