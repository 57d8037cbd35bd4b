//! Ordered schema migrations for tenant databases.
//!
//! Applied versions are tracked in a `schema_migrations` table inside each
//! tenant database, so re-running the migrator against an existing tenant
//! is a no-op for already-applied units. There is no per-unit rollback; a
//! failed run is handled by the provisioner dropping the whole database.

use tracing::{debug, info};

use crate::error::{BooklineError, Result};
use crate::tenancy::engine::TenantConnection;

const BOOKKEEPING_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// One versioned migration unit.
#[derive(Debug, Clone)]
pub struct MigrationUnit {
    /// Strictly increasing version, conventionally a timestamp
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Applies ordered migration units to a tenant database.
#[derive(Debug, Clone)]
pub struct SchemaMigrator {
    units: Vec<MigrationUnit>,
}

impl SchemaMigrator {
    /// Build a migrator from units, which must have unique versions.
    pub fn new(mut units: Vec<MigrationUnit>) -> Result<Self> {
        units.sort_by_key(|u| u.version);
        for pair in units.windows(2) {
            if pair[0].version == pair[1].version {
                return Err(BooklineError::validation(format!(
                    "Duplicate migration version {}",
                    pair[0].version
                )));
            }
        }
        Ok(Self { units })
    }

    /// The base schema every new tenant database receives.
    pub fn base() -> Self {
        Self {
            units: base_units(),
        }
    }

    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    /// Apply all pending units in order. Returns the number applied.
    ///
    /// The first failing unit aborts the run and surfaces its cause;
    /// previously applied units stay applied (the caller decides whether
    /// the database survives).
    pub async fn migrate(&self, conn: &dyn TenantConnection) -> Result<usize> {
        conn.execute(BOOKKEEPING_TABLE).await?;

        let applied = conn
            .query_i64_column("SELECT version FROM schema_migrations ORDER BY version")
            .await?;

        let mut count = 0;
        for unit in &self.units {
            if applied.contains(&unit.version) {
                debug!(version = unit.version, name = unit.name, "Already applied, skipping");
                continue;
            }

            conn.execute(unit.sql).await.map_err(|e| {
                BooklineError::provisioning(format!(
                    "Migration {} ({}) failed: {}",
                    unit.version, unit.name, e
                ))
            })?;

            conn.execute(&format!(
                "INSERT INTO schema_migrations (version, name) VALUES ({}, '{}')",
                unit.version, unit.name
            ))
            .await?;

            info!(version = unit.version, name = unit.name, "Applied migration");
            count += 1;
        }

        Ok(count)
    }
}

fn base_units() -> Vec<MigrationUnit> {
    vec![
        MigrationUnit {
            version: 20250925074618,
            name: "create-users",
            sql: "CREATE TABLE users (
                id UUID PRIMARY KEY,
                first_name VARCHAR(255) NOT NULL,
                last_name VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password VARCHAR(255) NOT NULL,
                phone VARCHAR(32),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
        MigrationUnit {
            version: 20250925081240,
            name: "create-appointments",
            sql: "CREATE TABLE appointments (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id),
                branch_id UUID NOT NULL,
                staff_id UUID NOT NULL,
                starts_at TIMESTAMPTZ NOT NULL,
                ends_at TIMESTAMPTZ NOT NULL,
                status VARCHAR(32) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        },
    ]
}
