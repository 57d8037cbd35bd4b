//! Staff registry and membership invariants.

pub mod directory;
pub mod storage;
pub mod types;

pub use directory::StaffDirectory;
pub use storage::StaffStore;
pub use types::{
    BranchMembership, NewStaffMember, OrganizationSnapshot, StaffMember, StaffRole,
    StaffSelfPatch, StaffUpdate,
};
