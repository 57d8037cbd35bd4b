//! In-memory store implementations for tests.
//!
//! Behavior mirrors the production stores where it matters: email and name
//! uniqueness produce `Conflict`, updates of missing rows produce
//! `NotFound`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{BooklineError, Result};
use crate::organizations::storage::{BranchStore, OrganizationStore, OwnerStore};
use crate::organizations::types::{Branch, Organization};
use crate::staff::storage::StaffStore;
use crate::staff::types::{StaffMember, StaffRole};

/// In-memory organization store.
#[derive(Default)]
pub struct InMemoryOrganizationStore {
    rows: RwLock<HashMap<Uuid, Organization>>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationStore for InMemoryOrganizationStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|o| o.name == name)
            .cloned())
    }

    async fn insert(&self, organization: Organization) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        if rows.values().any(|o| o.name == organization.name) {
            return Err(BooklineError::conflict(
                "Organization with this name already exists",
            ));
        }
        rows.insert(organization.id, organization);
        Ok(())
    }

    async fn update(&self, organization: Organization) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        if !rows.contains_key(&organization.id) {
            return Err(BooklineError::not_found("Organization not found"));
        }
        rows.insert(organization.id, organization);
        Ok(())
    }
}

/// In-memory branch store.
#[derive(Default)]
pub struct InMemoryBranchStore {
    rows: RwLock<HashMap<Uuid, Branch>>,
}

impl InMemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BranchStore for InMemoryBranchStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn insert(&self, branch: Branch) -> Result<()> {
        self.rows.write().unwrap().insert(branch.id, branch);
        Ok(())
    }

    async fn update(&self, branch: Branch) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        if !rows.contains_key(&branch.id) {
            return Err(BooklineError::not_found("Branch not found"));
        }
        rows.insert(branch.id, branch);
        Ok(())
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<Branch>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|b| b.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn count_by_organization(&self, organization_id: Uuid) -> Result<u32> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|b| b.organization_id == organization_id)
            .count() as u32)
    }
}

/// In-memory owner lookup.
#[derive(Default)]
pub struct InMemoryOwnerStore {
    ids: RwLock<Vec<Uuid>>,
}

impl InMemoryOwnerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, owner_id: Uuid) {
        self.ids.write().unwrap().push(owner_id);
    }
}

#[async_trait]
impl OwnerStore for InMemoryOwnerStore {
    async fn exists(&self, owner_id: Uuid) -> Result<bool> {
        Ok(self.ids.read().unwrap().contains(&owner_id))
    }
}

/// In-memory staff store.
#[derive(Default)]
pub struct InMemoryStaffStore {
    rows: RwLock<HashMap<Uuid, StaffMember>>,
}

impl InMemoryStaffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StaffStore for InMemoryStaffStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StaffMember>> {
        Ok(self.rows.read().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<StaffMember>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|m| m.email == email)
            .cloned())
    }

    async fn find_by_email_and_token(
        &self,
        email: &str,
        token: &str,
    ) -> Result<Option<StaffMember>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .find(|m| m.email == email && m.session_token.as_deref() == Some(token))
            .cloned())
    }

    async fn insert(&self, member: StaffMember) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        if rows.values().any(|m| m.email == member.email) {
            return Err(BooklineError::conflict(
                "Staff member with this email already exists",
            ));
        }
        rows.insert(member.id, member);
        Ok(())
    }

    async fn update(&self, member: StaffMember) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        if !rows.contains_key(&member.id) {
            return Err(BooklineError::not_found("Staff member not found"));
        }
        if rows
            .values()
            .any(|m| m.id != member.id && m.email == member.email)
        {
            return Err(BooklineError::conflict(
                "Staff member with this email already exists",
            ));
        }
        rows.insert(member.id, member);
        Ok(())
    }

    async fn set_session_token(&self, id: Uuid, token: Option<String>) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        let member = rows
            .get_mut(&id)
            .ok_or_else(|| BooklineError::not_found("Staff member not found"))?;
        member.session_token = token;
        Ok(())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        role: Option<StaffRole>,
    ) -> Result<Vec<StaffMember>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .values()
            .filter(|m| m.organization.id == organization_id)
            .filter(|m| role.map(|r| m.role == r).unwrap_or(true))
            .cloned()
            .collect())
    }
}
