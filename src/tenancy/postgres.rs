//! Postgres tenant engine backed by SeaORM.
//!
//! Holds a pool against the master database for DDL and opens short-lived
//! pools against tenant databases on demand. The master URL is rewritten
//! with the tenant database name when connecting; all tenants live on the
//! same server as the master database.

use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, Database, DatabaseBackend, DatabaseConnection, ConnectionTrait, Statement,
};
use tracing::info;

use crate::config::{DatabaseConfig, redact_database_url};
use crate::error::{BooklineError, Result};
use crate::tenancy::engine::{TenantConnection, TenantEngine};

/// SeaORM-backed tenant engine.
pub struct PostgresTenantEngine {
    master: DatabaseConnection,
    config: DatabaseConfig,
    /// Redacted URL (safe for logging)
    redacted_url: String,
}

impl PostgresTenantEngine {
    /// Connect to the master database and build the engine.
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let master = open_connection(&config, &config.master_url).await?;
        let redacted_url = redact_database_url(&config.master_url);

        info!(url = %redacted_url, "Connected to master database");

        Ok(Self {
            master,
            config,
            redacted_url,
        })
    }

    /// The redacted master URL, for logging.
    pub fn master_url(&self) -> &str {
        &self.redacted_url
    }

    /// Rewrite the master URL to point at a tenant database.
    fn tenant_url(&self, name: &str) -> String {
        rewrite_database_name(&self.config.master_url, name)
    }
}

#[async_trait]
impl TenantEngine for PostgresTenantEngine {
    async fn create_database(&self, name: &str) -> Result<()> {
        // CREATE DATABASE cannot be parameterized; the name has already
        // passed the provisioner's sanitization gate.
        let sql = format!("CREATE DATABASE \"{}\"", name);
        self.master.execute_unprepared(&sql).await.map_err(|e| {
            let text = e.to_string();
            if text.contains("already exists") {
                BooklineError::conflict(format!("Database \"{}\" already exists", name))
            } else {
                BooklineError::database(format!("CREATE DATABASE failed: {}", text))
            }
        })?;

        info!(database = %name, "Created tenant database");
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        let sql = format!("DROP DATABASE IF EXISTS \"{}\"", name);
        self.master
            .execute_unprepared(&sql)
            .await
            .map_err(|e| BooklineError::database(format!("DROP DATABASE failed: {}", e)))?;

        info!(database = %name, "Dropped tenant database");
        Ok(())
    }

    async fn connect(&self, name: &str) -> Result<Box<dyn TenantConnection>> {
        let url = self.tenant_url(name);
        let conn = open_connection(&self.config, &url).await?;
        Ok(Box::new(PostgresTenantConnection { conn }))
    }
}

struct PostgresTenantConnection {
    conn: DatabaseConnection,
}

#[async_trait]
impl TenantConnection for PostgresTenantConnection {
    async fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_unprepared(sql).await?;
        Ok(())
    }

    async fn query_i64_column(&self, sql: &str) -> Result<Vec<i64>> {
        let rows = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                sql.to_string(),
            ))
            .await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            values.push(row.try_get_by_index::<i64>(0)?);
        }
        Ok(values)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| BooklineError::database(format!("Failed to close connection: {}", e)))
    }
}

async fn open_connection(config: &DatabaseConfig, url: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        BooklineError::database(format!(
            "Failed to connect to {}: {}",
            redact_database_url(url),
            e
        ))
    })
}

/// Replace the database name in a connection URL, preserving any query
/// string.
fn rewrite_database_name(url: &str, name: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    // The database name is everything after the last '/' past the scheme
    let rewritten = match base.rfind('/') {
        Some(idx) if idx > base.find("://").map(|i| i + 2).unwrap_or(0) => {
            format!("{}/{}", &base[..idx], name)
        }
        _ => format!("{}/{}", base.trim_end_matches('/'), name),
    };

    match query {
        Some(q) => format!("{}?{}", rewritten, q),
        None => rewritten,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_database_name() {
        assert_eq!(
            rewrite_database_name("postgres://u:p@host:5432/master", "acme"),
            "postgres://u:p@host:5432/acme"
        );
    }

    #[test]
    fn test_rewrite_preserves_query() {
        assert_eq!(
            rewrite_database_name("postgres://u:p@host/master?sslmode=require", "acme"),
            "postgres://u:p@host/acme?sslmode=require"
        );
    }

    #[test]
    fn test_rewrite_without_database_segment() {
        assert_eq!(
            rewrite_database_name("postgres://host", "acme"),
            "postgres://host/acme"
        );
    }
}
