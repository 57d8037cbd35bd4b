//! Staff member types.
//!
//! A staff record embeds a denormalized snapshot of its organization and of
//! every branch the member works at. The snapshots are projections of the
//! canonical rows, written only after validation against the canonical
//! branch registry; they are never accepted verbatim from a caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BooklineError;

/// Role of a staff member within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Full control over the organization's staff and branches
    Manager,
    /// Regular staff member, may only edit their own profile
    Employee,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = BooklineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            other => Err(BooklineError::validation(format!(
                "Unknown staff role: {}",
                other
            ))),
        }
    }
}

/// Denormalized organization reference embedded in a staff record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSnapshot {
    pub id: Uuid,
    pub name: String,
}

/// Denormalized branch membership embedded in a staff record.
///
/// Written only from a canonical branch row that passed validation; the
/// canonical registry remains the source of truth for everything else
/// about the branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMembership {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

/// A staff member of one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub organization: OrganizationSnapshot,
    /// Always non-empty while the record exists
    pub branches: Vec<BranchMembership>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// PHC-formatted Argon2id hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The currently valid access token, if logged in. Token verification
    /// requires an exact match against this value, which makes logout and
    /// re-login server-side revocation points.
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub role: StaffRole,
    pub is_active: bool,
    pub username: Option<String>,
    pub specialty: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

impl StaffMember {
    pub fn is_member_of(&self, branch_id: Uuid) -> bool {
        self.branches.iter().any(|b| b.id == branch_id)
    }
}

/// Input for creating a staff member.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffMember {
    pub organization_id: Uuid,
    /// Proposed branch ids; every one must belong to the organization
    pub branch_ids: Vec<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: StaffRole,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Manager-gated update to a staff record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    /// Move the member to another organization; memberships are
    /// re-validated against it
    pub organization_id: Option<Uuid>,
    /// When present, replaces the membership set after re-validation
    pub branch_ids: Option<Vec<Uuid>>,
    pub username: Option<String>,
    pub specialty: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

/// Fields a staff member may change on their own record.
///
/// Role, organization, and branch memberships are deliberately absent; a
/// self-service request carrying them is rejected before this type exists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffSelfPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub specialty: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("manager".parse::<StaffRole>().unwrap(), StaffRole::Manager);
        assert_eq!(
            "Employee".parse::<StaffRole>().unwrap(),
            StaffRole::Employee
        );
        assert_eq!(StaffRole::Manager.to_string(), "manager");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("admin".parse::<StaffRole>().is_err());
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&StaffRole::Employee).unwrap();
        assert_eq!(json, "\"employee\"");
        let back: StaffRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StaffRole::Employee);
    }

    #[test]
    fn test_is_member_of() {
        let branch_id = Uuid::new_v4();
        let member = StaffMember {
            id: Uuid::new_v4(),
            organization: OrganizationSnapshot {
                id: Uuid::new_v4(),
                name: "Acme".into(),
            },
            branches: vec![BranchMembership {
                id: branch_id,
                name: "Downtown".into(),
                address: "1 Main St".into(),
            }],
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@acme.test".into(),
            password_hash: String::new(),
            session_token: None,
            role: StaffRole::Employee,
            is_active: true,
            username: None,
            specialty: None,
            description: None,
            photo_url: None,
        };

        assert!(member.is_member_of(branch_id));
        assert!(!member.is_member_of(Uuid::new_v4()));
    }
}
