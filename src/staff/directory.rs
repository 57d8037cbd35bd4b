//! Staff registry with branch-membership invariants.
//!
//! Every mutation that touches the embedded membership list goes through
//! canonical validation: a proposed branch id must exist in the branch
//! registry AND belong to the target organization, and only the validated
//! `{id, name, address}` projection is ever stored. A staff record always
//! keeps at least one membership.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedStaff;
use crate::auth::password::PasswordHasher;
use crate::auth::session::normalize_email;
use crate::error::{BooklineError, Result};
use crate::organizations::storage::{BranchStore, OrganizationStore};
use crate::staff::storage::StaffStore;
use crate::staff::types::{
    BranchMembership, NewStaffMember, OrganizationSnapshot, StaffMember, StaffRole, StaffSelfPatch,
    StaffUpdate,
};

/// Fields a non-manager may never touch on their own record.
const PROTECTED_SELF_FIELDS: &[&str] = &["role", "organization", "branches"];

/// Manages staff records of all organizations.
pub struct StaffDirectory {
    staff: Arc<dyn StaffStore>,
    branches: Arc<dyn BranchStore>,
    organizations: Arc<dyn OrganizationStore>,
    hasher: PasswordHasher,
    min_password_length: usize,
}

impl StaffDirectory {
    pub fn new(
        staff: Arc<dyn StaffStore>,
        branches: Arc<dyn BranchStore>,
        organizations: Arc<dyn OrganizationStore>,
        hasher: PasswordHasher,
        min_password_length: usize,
    ) -> Self {
        Self {
            staff,
            branches,
            organizations,
            hasher,
            min_password_length,
        }
    }

    /// Create a staff member.
    ///
    /// The proposed branch set must be non-empty and every id must resolve
    /// to a branch of the target organization; any miss fails the whole
    /// create naming the offending branch. Only validated projections are
    /// stored.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: NewStaffMember) -> Result<StaffMember> {
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(BooklineError::validation("Email must not be empty"));
        }
        if input.password.len() < self.min_password_length {
            return Err(BooklineError::validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        let organization = self
            .organizations
            .find_by_id(input.organization_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Organization not found"))?;

        let memberships = self
            .validate_branches(&input.branch_ids, organization.id)
            .await?;

        if self.staff.find_by_email(&email).await?.is_some() {
            return Err(BooklineError::conflict(
                "Staff member with this email already exists",
            ));
        }

        let member = StaffMember {
            id: Uuid::new_v4(),
            organization: OrganizationSnapshot {
                id: organization.id,
                name: organization.name.clone(),
            },
            branches: memberships,
            first_name: input.first_name,
            last_name: input.last_name,
            email,
            password_hash: self.hasher.hash(&input.password)?,
            session_token: None,
            role: input.role,
            is_active: true,
            username: input.username,
            specialty: input.specialty,
            description: input.description,
            photo_url: input.photo_url,
        };

        self.staff.insert(member.clone()).await?;
        info!(staff_id = %member.id, role = %member.role, "Staff member created");
        Ok(member)
    }

    /// Apply a manager-gated update to a staff record.
    ///
    /// An email change is re-checked for uniqueness. Memberships are
    /// re-validated against the effective target organization: the newly
    /// supplied one if the member is being moved, otherwise the current
    /// one. Moving a member re-validates even an unchanged membership
    /// set, since branches of the old organization are foreign to the
    /// new one.
    #[instrument(skip(self, update))]
    pub async fn update(&self, staff_id: Uuid, update: StaffUpdate) -> Result<StaffMember> {
        let mut member = self.get(staff_id).await?;

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email != member.email {
                if self.staff.find_by_email(&email).await?.is_some() {
                    return Err(BooklineError::conflict(
                        "Staff member with this email already exists",
                    ));
                }
                member.email = email;
                // A changed email invalidates the stored token's claims
                member.session_token = None;
            }
        }

        let mut organization_moved = false;
        if let Some(target_id) = update.organization_id {
            if target_id != member.organization.id {
                let organization = self
                    .organizations
                    .find_by_id(target_id)
                    .await?
                    .ok_or_else(|| BooklineError::not_found("Organization not found"))?;
                member.organization = OrganizationSnapshot {
                    id: organization.id,
                    name: organization.name,
                };
                organization_moved = true;
            }
        }

        if update.branch_ids.is_some() || organization_moved {
            let branch_ids: Vec<Uuid> = match update.branch_ids {
                Some(ids) => ids,
                None => member.branches.iter().map(|b| b.id).collect(),
            };
            member.branches = self
                .validate_branches(&branch_ids, member.organization.id)
                .await?;
        }
        if let Some(first_name) = update.first_name {
            member.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            member.last_name = last_name;
        }
        if let Some(role) = update.role {
            member.role = role;
        }
        if let Some(username) = update.username {
            member.username = Some(username);
        }
        if let Some(specialty) = update.specialty {
            member.specialty = Some(specialty);
        }
        if let Some(description) = update.description {
            member.description = Some(description);
        }
        if let Some(photo_url) = update.photo_url {
            member.photo_url = Some(photo_url);
        }

        self.staff.update(member.clone()).await?;
        Ok(member)
    }

    /// Add a branch membership.
    ///
    /// The branch must exist in the canonical registry and belong to the
    /// member's organization; duplicates are a conflict.
    #[instrument(skip(self))]
    pub async fn add_branch(&self, staff_id: Uuid, branch_id: Uuid) -> Result<StaffMember> {
        let mut member = self.get(staff_id).await?;

        if member.is_member_of(branch_id) {
            return Err(BooklineError::conflict(
                "Staff member already works at this branch",
            ));
        }

        let branch = self
            .branches
            .find_by_id(branch_id)
            .await?
            .filter(|b| b.organization_id == member.organization.id)
            .ok_or_else(|| {
                BooklineError::not_found(format!("Branch {} not found", branch_id))
            })?;

        member.branches.push(BranchMembership {
            id: branch.id,
            name: branch.name,
            address: branch.address,
        });

        self.staff.update(member.clone()).await?;
        info!(staff_id = %member.id, %branch_id, "Branch membership added");
        Ok(member)
    }

    /// Remove a branch membership.
    ///
    /// Removing the last membership is rejected and leaves the record
    /// unchanged; a staff member always works somewhere.
    #[instrument(skip(self))]
    pub async fn remove_branch(&self, staff_id: Uuid, branch_id: Uuid) -> Result<StaffMember> {
        let mut member = self.get(staff_id).await?;

        if !member.is_member_of(branch_id) {
            return Err(BooklineError::not_found(format!(
                "Branch {} is not among the staff member's branches",
                branch_id
            )));
        }

        if member.branches.len() == 1 {
            return Err(BooklineError::conflict(
                "Staff member must belong to at least one branch",
            ));
        }

        member.branches.retain(|b| b.id != branch_id);
        self.staff.update(member.clone()).await?;
        info!(staff_id = %member.id, %branch_id, "Branch membership removed");
        Ok(member)
    }

    /// Apply a self-service patch.
    ///
    /// A non-manager may only touch their own record, and the patch is
    /// inspected as raw JSON first: `role`, `organization` and `branches`
    /// are rejected outright rather than silently dropped.
    #[instrument(skip(self, patch))]
    pub async fn self_patch(
        &self,
        actor: &AuthenticatedStaff,
        staff_id: Uuid,
        patch: serde_json::Value,
    ) -> Result<StaffMember> {
        if actor.role != StaffRole::Manager && actor.id != staff_id {
            return Err(BooklineError::authorization(
                "Staff members may only edit their own profile",
            ));
        }

        if let Some(object) = patch.as_object() {
            for field in PROTECTED_SELF_FIELDS {
                if object.contains_key(*field) {
                    return Err(BooklineError::authorization(format!(
                        "Field '{}' cannot be changed through profile updates",
                        field
                    )));
                }
            }
        }

        let patch: StaffSelfPatch = serde_json::from_value(patch)?;
        let mut member = self.get(staff_id).await?;

        if let Some(first_name) = patch.first_name {
            member.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            member.last_name = last_name;
        }
        if let Some(username) = patch.username {
            member.username = Some(username);
        }
        if let Some(specialty) = patch.specialty {
            member.specialty = Some(specialty);
        }
        if let Some(description) = patch.description {
            member.description = Some(description);
        }
        if let Some(photo_url) = patch.photo_url {
            member.photo_url = Some(photo_url);
        }

        self.staff.update(member.clone()).await?;
        Ok(member)
    }

    /// Activate or deactivate a staff member. Deactivation also clears the
    /// stored session token, closing any live session.
    #[instrument(skip(self))]
    pub async fn set_active(&self, staff_id: Uuid, is_active: bool) -> Result<StaffMember> {
        let mut member = self.get(staff_id).await?;
        member.is_active = is_active;
        if !is_active {
            member.session_token = None;
        }
        self.staff.update(member.clone()).await?;
        info!(staff_id = %member.id, is_active, "Staff member active state changed");
        Ok(member)
    }

    pub async fn get(&self, staff_id: Uuid) -> Result<StaffMember> {
        self.staff
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Staff member not found"))
    }

    /// List staff of an organization, optionally filtered by role.
    pub async fn list(
        &self,
        organization_id: Uuid,
        role: Option<StaffRole>,
    ) -> Result<Vec<StaffMember>> {
        self.staff.list_by_organization(organization_id, role).await
    }

    /// List staff of one branch.
    pub async fn list_by_branch(
        &self,
        organization_id: Uuid,
        branch_id: Uuid,
        role: Option<StaffRole>,
    ) -> Result<Vec<StaffMember>> {
        let members = self.staff.list_by_organization(organization_id, role).await?;
        Ok(members
            .into_iter()
            .filter(|m| m.is_member_of(branch_id))
            .collect())
    }

    /// Resolve proposed branch ids against the canonical registry.
    ///
    /// Fails if the set is empty or any id does not resolve to a branch of
    /// the given organization. Duplicate ids are collapsed.
    async fn validate_branches(
        &self,
        branch_ids: &[Uuid],
        organization_id: Uuid,
    ) -> Result<Vec<BranchMembership>> {
        if branch_ids.is_empty() {
            return Err(BooklineError::validation(
                "Staff member must be assigned to at least one branch",
            ));
        }

        let mut seen = HashSet::new();
        let mut memberships = Vec::new();
        for &branch_id in branch_ids {
            if !seen.insert(branch_id) {
                continue;
            }

            let branch = self
                .branches
                .find_by_id(branch_id)
                .await?
                .filter(|b| b.organization_id == organization_id)
                .ok_or_else(|| {
                    BooklineError::not_found(format!("Branch {} not found", branch_id))
                })?;

            memberships.push(BranchMembership {
                id: branch.id,
                name: branch.name,
                address: branch.address,
            });
        }

        Ok(memberships)
    }
}
