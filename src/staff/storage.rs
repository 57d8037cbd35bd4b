//! Staff persistence trait.
//!
//! Backed by the control-plane database in production and by the in-memory
//! store in `testing` for tests. Email uniqueness is delegated to the
//! backing store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::staff::types::{StaffMember, StaffRole};

/// Storage backend for staff records.
#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Find a staff member by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffMember>>;

    /// Find a staff member by email (normalized lowercase).
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffMember>>;

    /// Find a staff member whose email AND stored session token both match.
    ///
    /// This is the revocation check: a token that verifies cryptographically
    /// but is not the stored one (logout, re-login elsewhere) finds nothing.
    async fn find_by_email_and_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<StaffMember>>;

    /// Insert a new staff record.
    ///
    /// Returns `Conflict` if the email is already taken.
    async fn insert(&self, member: StaffMember) -> Result<()>;

    /// Replace an existing staff record.
    ///
    /// Returns `NotFound` if the id does not exist and `Conflict` if the
    /// new email collides with another record.
    async fn update(&self, member: StaffMember) -> Result<()>;

    /// Overwrite the stored session token (last-writer-wins).
    async fn set_session_token(&self, id: Uuid, token: Option<String>) -> Result<()>;

    /// List staff of an organization, optionally filtered by role.
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        role: Option<StaffRole>,
    ) -> Result<Vec<StaffMember>>;
}
