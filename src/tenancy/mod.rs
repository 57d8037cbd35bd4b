//! Tenant database lifecycle.
//!
//! Each organization gets its own physical database. [`TenantProvisioner`]
//! drives create → connect → migrate with a compensating drop on failure,
//! over the [`TenantEngine`] seam so tests can run against an in-memory
//! engine. [`PostgresTenantEngine`] is the production implementation.

pub mod engine;
pub mod migrator;
pub mod postgres;
pub mod provisioner;

pub use engine::{TenantConnection, TenantEngine};
pub use migrator::{MigrationUnit, SchemaMigrator};
pub use postgres::PostgresTenantEngine;
pub use provisioner::{TenantProvisioner, TenantReady, sanitize_tenant_name};
