//! Tenant database engine abstraction.
//!
//! These traits are the seam between the provisioning logic and the actual
//! database server, allowing tests to run the full provisioning flow
//! against an in-memory engine with injected failures.

use async_trait::async_trait;

use crate::error::Result;

/// A handle to one tenant database.
///
/// Obtained from [`TenantEngine::connect`]; must be closed (or dropped)
/// before the database can be dropped again.
#[async_trait]
pub trait TenantConnection: Send + Sync {
    /// Execute a statement that returns no rows (DDL, inserts).
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Run a query whose result is a single bigint column.
    ///
    /// Used by the migrator to read applied versions from the bookkeeping
    /// table.
    async fn query_i64_column(&self, sql: &str) -> Result<Vec<i64>>;

    /// Close the connection, releasing it from the target database.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A database server that can host tenant databases.
#[async_trait]
pub trait TenantEngine: Send + Sync {
    /// `CREATE DATABASE "<name>"` via the master connection.
    ///
    /// Returns `Conflict` if the database already exists.
    async fn create_database(&self, name: &str) -> Result<()>;

    /// `DROP DATABASE IF EXISTS "<name>"` via the master connection.
    ///
    /// Idempotent; dropping a database that does not exist succeeds.
    async fn drop_database(&self, name: &str) -> Result<()>;

    /// Open a connection to an existing tenant database.
    async fn connect(&self, name: &str) -> Result<Box<dyn TenantConnection>>;
}
