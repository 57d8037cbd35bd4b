//! Tenant database provisioning.
//!
//! Creates one physical database per organization and migrates it, with a
//! compensating drop on failure. The observable outcome is binary: after
//! `provision` returns, the tenant database either exists fully migrated or
//! does not exist at all.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{error, info, instrument, warn};

use crate::error::{BooklineError, Result};
use crate::tenancy::engine::TenantEngine;
use crate::tenancy::migrator::SchemaMigrator;

/// Postgres identifier limit
const MAX_TENANT_NAME_LEN: usize = 63;

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantReady {
    /// Final (sanitized) database name
    pub database: String,
    /// Number of migration units applied
    pub migrations_applied: usize,
}

/// Provisions tenant databases over a [`TenantEngine`].
pub struct TenantProvisioner {
    engine: Arc<dyn TenantEngine>,
    migrator: SchemaMigrator,
    /// Names with a provisioning run currently in flight
    in_flight: Mutex<HashSet<String>>,
}

impl TenantProvisioner {
    pub fn new(engine: Arc<dyn TenantEngine>, migrator: SchemaMigrator) -> Self {
        Self {
            engine,
            migrator,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Provision a tenant database for the given name.
    ///
    /// The name must pass the sanitization gate: start with a letter,
    /// contain only letters, digits, `_` and `-`, and fit in a Postgres
    /// identifier. At most one provisioning run per name may be in flight;
    /// a concurrent duplicate fails with `Conflict` immediately.
    #[instrument(skip(self))]
    pub async fn provision(&self, tenant_name: &str) -> Result<TenantReady> {
        let name = sanitize_tenant_name(tenant_name)?;

        let _guard = InFlightGuard::acquire(&self.in_flight, &name)?;

        // Creation failure needs no rollback; nothing exists yet
        self.engine.create_database(&name).await?;

        let conn = match self.engine.connect(&name).await {
            Ok(conn) => conn,
            Err(e) => {
                self.rollback(&name).await;
                return Err(BooklineError::provisioning(format!(
                    "Failed to connect to new tenant database \"{}\": {}",
                    name, e
                )));
            }
        };

        match self.migrator.migrate(conn.as_ref()).await {
            Ok(applied) => {
                if let Err(e) = conn.close().await {
                    warn!(database = %name, error = %e, "Failed to close tenant connection");
                }
                info!(database = %name, migrations = applied, "Tenant provisioned");
                Ok(TenantReady {
                    database: name,
                    migrations_applied: applied,
                })
            }
            Err(e) => {
                // Best-effort close so the drop below is not blocked by our
                // own connection; secondary errors are logged, not surfaced
                if let Err(close_err) = conn.close().await {
                    warn!(database = %name, error = %close_err, "Failed to close tenant connection during rollback");
                }
                self.rollback(&name).await;
                Err(BooklineError::provisioning(format!(
                    "Migration of tenant database \"{}\" failed: {}",
                    name, e
                )))
            }
        }
    }

    /// Drop a tenant database by name.
    ///
    /// Used as the compensating step when persisting the organization row
    /// fails after provisioning succeeded. Idempotent.
    #[instrument(skip(self))]
    pub async fn deprovision(&self, tenant_name: &str) -> Result<()> {
        let name = sanitize_tenant_name(tenant_name)?;
        let _guard = InFlightGuard::acquire(&self.in_flight, &name)?;
        self.engine.drop_database(&name).await
    }

    async fn rollback(&self, name: &str) {
        if let Err(e) = self.engine.drop_database(name).await {
            error!(database = %name, error = %e, "Compensating drop failed; manual cleanup required");
        }
    }
}

/// Removes the name from the in-flight set when dropped, so the guard is
/// released on every exit path including panics.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    name: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, name: &str) -> Result<Self> {
        let mut guard = set
            .lock()
            .map_err(|_| BooklineError::internal("In-flight guard poisoned"))?;

        if !guard.insert(name.to_string()) {
            return Err(BooklineError::conflict(format!(
                "Provisioning of \"{}\" is already in progress",
                name
            )));
        }

        Ok(Self {
            set,
            name: name.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.set.lock() {
            guard.remove(&self.name);
        }
    }
}

/// Validate and normalize a tenant database name.
///
/// Lowercases the trimmed input, then requires: non-empty, at most 63
/// bytes, starts with a letter, and contains only letters, digits, `_`
/// and `-`. Anything else is rejected rather than repaired, so a caller
/// can never smuggle SQL through the interpolated identifier.
pub fn sanitize_tenant_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();

    if name.is_empty() {
        return Err(BooklineError::validation("Tenant name must not be empty"));
    }
    if name.len() > MAX_TENANT_NAME_LEN {
        return Err(BooklineError::validation(format!(
            "Tenant name must be at most {} characters",
            MAX_TENANT_NAME_LEN
        )));
    }
    if !name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
    {
        return Err(BooklineError::validation(
            "Tenant name must start with a letter",
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(BooklineError::validation(
            "Tenant name may only contain letters, digits, '_' and '-'",
        ));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_accepts_simple_names() {
        assert_eq!(sanitize_tenant_name("acme").unwrap(), "acme");
        assert_eq!(sanitize_tenant_name("  Acme-2 ").unwrap(), "acme-2");
        assert_eq!(sanitize_tenant_name("a_b-c3").unwrap(), "a_b-c3");
    }

    #[test]
    fn test_sanitize_rejects_empty_and_long() {
        assert!(sanitize_tenant_name("").is_err());
        assert!(sanitize_tenant_name("   ").is_err());
        assert!(sanitize_tenant_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_sanitize_rejects_leading_digit() {
        assert!(sanitize_tenant_name("1acme").is_err());
    }

    #[test]
    fn test_sanitize_rejects_sql_metacharacters() {
        assert!(sanitize_tenant_name("acme\"; DROP DATABASE master").is_err());
        assert!(sanitize_tenant_name("acme corp").is_err());
        assert!(sanitize_tenant_name("acme.corp").is_err());
    }

    #[test]
    fn test_in_flight_guard_blocks_and_releases() {
        let set = Mutex::new(HashSet::new());

        let guard = InFlightGuard::acquire(&set, "acme").unwrap();
        assert!(InFlightGuard::acquire(&set, "acme").is_err());
        // Other names are unaffected
        let other = InFlightGuard::acquire(&set, "globex").unwrap();
        drop(other);

        drop(guard);
        assert!(InFlightGuard::acquire(&set, "acme").is_ok());
    }
}
