//! Bookline - multi-tenant booking platform core
//!
//! Bookline provides the two load-bearing subsystems of a multi-tenant
//! booking backend, built on Axum and Tokio:
//!
//! - **Tenant provisioning**: one physical database per organization,
//!   created and migrated atomically with a compensating drop on failure
//! - **Staff authorization**: two-secret JWT issuance with server-side
//!   revocation, role-based access control, and branch-membership
//!   invariants on staff records
//!
//! plus the canonical organization/branch/staff registries those two
//! subsystems depend on.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bookline::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     bookline::init_tracing();
//!
//!     let config = ConfigBuilder::new()
//!         .from_env()
//!         .build()
//!         .unwrap();
//!
//!     // wire stores, tenancy engine, and managers here
//!     let _ = config;
//! }
//! ```

pub mod auth;
mod config;
mod error;
pub mod organizations;
pub mod staff;
pub mod tenancy;
pub mod testing;

// Re-exports for public API
pub use auth::{
    AccessClaims, AuthenticatedStaff, PasswordHasher, RefreshClaims, SessionService, TokenService,
};
pub use config::{
    AuthConfig, Config, ConfigBuilder, DatabaseConfig, LoggingConfig, ServerConfig,
    redact_database_url,
};
pub use error::{BooklineError, ErrorResponse, Result};
pub use organizations::{Branch, BranchManager, Organization, OrganizationManager};
pub use staff::{BranchMembership, OrganizationSnapshot, StaffDirectory, StaffMember, StaffRole};
pub use tenancy::{SchemaMigrator, TenantEngine, TenantProvisioner, TenantReady};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "bookline=debug")
/// - `BOOKLINE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("BOOKLINE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
