//! Test support: in-memory stores, a fake tenant engine with failure
//! injection, and record fixtures.
//!
//! Everything here is usable from integration tests and from downstream
//! crates' test suites; nothing depends on a running database.

pub mod fixtures;
pub mod stores;
pub mod tenancy;

pub use stores::{
    InMemoryBranchStore, InMemoryOrganizationStore, InMemoryOwnerStore, InMemoryStaffStore,
};
pub use tenancy::InMemoryTenantEngine;
