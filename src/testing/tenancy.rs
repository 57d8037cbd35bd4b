//! In-memory tenant engine with failure injection.
//!
//! Emulates just enough of a database server to exercise the full
//! provisioning flow: databases can be created, connected to, migrated
//! (the `schema_migrations` bookkeeping is replayed in memory) and
//! dropped. Failures can be injected at each stage.

use std::collections::{HashMap, HashSet};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicIsize, Ordering},
};

use async_trait::async_trait;

use crate::error::{BooklineError, Result};
use crate::tenancy::engine::{TenantConnection, TenantEngine};

#[derive(Default)]
struct TenantDb {
    /// (version, name) rows of the emulated schema_migrations table
    applied: Vec<(i64, String)>,
    /// Every non-bookkeeping statement executed against this database
    statements: Vec<String>,
}

#[derive(Default)]
struct EngineState {
    databases: HashMap<String, TenantDb>,
    fail_create_for: HashSet<String>,
    fail_connect_for: HashSet<String>,
    /// Statements containing this substring fail
    fail_sql_containing: Option<String>,
}

/// Fake tenant database server for tests.
#[derive(Default)]
pub struct InMemoryTenantEngine {
    state: Arc<Mutex<EngineState>>,
    open_connections: Arc<AtomicIsize>,
}

impl InMemoryTenantEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_database` fail for the given name.
    pub fn fail_create(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_create_for
            .insert(name.to_string());
    }

    /// Make `connect` fail for the given name.
    pub fn fail_connect(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_connect_for
            .insert(name.to_string());
    }

    /// Make any statement containing the substring fail.
    pub fn fail_sql_containing(&self, fragment: &str) {
        self.state.lock().unwrap().fail_sql_containing = Some(fragment.to_string());
    }

    pub fn database_exists(&self, name: &str) -> bool {
        self.state.lock().unwrap().databases.contains_key(name)
    }

    /// Applied migration versions of a database, if it exists.
    pub fn applied_versions(&self, name: &str) -> Option<Vec<i64>> {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(name)
            .map(|db| db.applied.iter().map(|(v, _)| *v).collect())
    }

    /// Statements executed against a database (bookkeeping excluded).
    pub fn statements(&self, name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(name)
            .map(|db| db.statements.clone())
            .unwrap_or_default()
    }

    /// Number of connections currently open. Zero means every connection
    /// handed out was released again.
    pub fn open_connections(&self) -> isize {
        self.open_connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantEngine for InMemoryTenantEngine {
    async fn create_database(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create_for.contains(name) {
            return Err(BooklineError::database(format!(
                "Injected create failure for \"{}\"",
                name
            )));
        }
        if state.databases.contains_key(name) {
            return Err(BooklineError::conflict(format!(
                "Database \"{}\" already exists",
                name
            )));
        }
        state.databases.insert(name.to_string(), TenantDb::default());
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().databases.remove(name);
        Ok(())
    }

    async fn connect(&self, name: &str) -> Result<Box<dyn TenantConnection>> {
        let state = self.state.lock().unwrap();
        if state.fail_connect_for.contains(name) {
            return Err(BooklineError::database(format!(
                "Injected connect failure for \"{}\"",
                name
            )));
        }
        if !state.databases.contains_key(name) {
            return Err(BooklineError::database(format!(
                "Database \"{}\" does not exist",
                name
            )));
        }
        drop(state);

        self.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTenantConnection {
            database: name.to_string(),
            state: self.state.clone(),
            open_connections: self.open_connections.clone(),
        }))
    }
}

struct InMemoryTenantConnection {
    database: String,
    state: Arc<Mutex<EngineState>>,
    open_connections: Arc<AtomicIsize>,
}

#[async_trait]
impl TenantConnection for InMemoryTenantConnection {
    async fn execute(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if let Some(fragment) = &state.fail_sql_containing {
            if sql.contains(fragment.as_str()) {
                return Err(BooklineError::database(format!(
                    "Injected failure on statement containing \"{}\"",
                    fragment
                )));
            }
        }

        let db = state
            .databases
            .get_mut(&self.database)
            .ok_or_else(|| BooklineError::database("Database was dropped"))?;

        // Replay the migrator's bookkeeping writes into memory
        if let Some(rest) = sql.strip_prefix("INSERT INTO schema_migrations") {
            if let Some((version, name)) = parse_bookkeeping_insert(rest) {
                db.applied.push((version, name));
                return Ok(());
            }
        }
        if sql.starts_with("CREATE TABLE IF NOT EXISTS schema_migrations") {
            return Ok(());
        }

        db.statements.push(sql.to_string());
        Ok(())
    }

    async fn query_i64_column(&self, sql: &str) -> Result<Vec<i64>> {
        let state = self.state.lock().unwrap();
        let db = state
            .databases
            .get(&self.database)
            .ok_or_else(|| BooklineError::database("Database was dropped"))?;

        if sql.contains("schema_migrations") {
            let mut versions: Vec<i64> = db.applied.iter().map(|(v, _)| *v).collect();
            versions.sort_unstable();
            return Ok(versions);
        }
        Ok(Vec::new())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.open_connections.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn parse_bookkeeping_insert(rest: &str) -> Option<(i64, String)> {
    // "... (version, name) VALUES (123, 'some-name')"
    let values = rest.split("VALUES (").nth(1)?;
    let mut parts = values.trim_end_matches(')').splitn(2, ',');
    let version = parts.next()?.trim().parse().ok()?;
    let name = parts.next()?.trim().trim_matches('\'').to_string();
    Some((version, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_connect_drop() {
        let engine = InMemoryTenantEngine::new();
        engine.create_database("acme").await.unwrap();
        assert!(engine.database_exists("acme"));

        let conn = engine.connect("acme").await.unwrap();
        assert_eq!(engine.open_connections(), 1);
        conn.close().await.unwrap();
        assert_eq!(engine.open_connections(), 0);

        engine.drop_database("acme").await.unwrap();
        assert!(!engine.database_exists("acme"));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let engine = InMemoryTenantEngine::new();
        engine.create_database("acme").await.unwrap();
        let err = engine.create_database("acme").await.unwrap_err();
        assert!(matches!(err, BooklineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bookkeeping_replay() {
        let engine = InMemoryTenantEngine::new();
        engine.create_database("acme").await.unwrap();
        let conn = engine.connect("acme").await.unwrap();

        conn.execute("CREATE TABLE IF NOT EXISTS schema_migrations (version BIGINT)")
            .await
            .unwrap();
        conn.execute("INSERT INTO schema_migrations (version, name) VALUES (42, 'init')")
            .await
            .unwrap();

        let versions = conn
            .query_i64_column("SELECT version FROM schema_migrations ORDER BY version")
            .await
            .unwrap();
        assert_eq!(versions, vec![42]);
        conn.close().await.unwrap();
    }
}
