//! Ready-made fixtures for tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::organizations::types::{Branch, Organization};
use crate::staff::types::{BranchMembership, OrganizationSnapshot, StaffMember, StaffRole};

pub fn organization(name: &str) -> Organization {
    Organization {
        id: Uuid::new_v4(),
        name: name.to_string(),
        owner_id: Uuid::new_v4(),
        branch_quota: 3,
        paid_through: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        is_active: true,
    }
}

pub fn branch(organization_id: Uuid, name: &str) -> Branch {
    Branch {
        id: Uuid::new_v4(),
        organization_id,
        name: name.to_string(),
        phone: "+1 555 0100".to_string(),
        address: format!("{} street 1", name),
        timezone: "Europe/London".to_string(),
        is_active: true,
    }
}

pub fn staff_member(organization: &Organization, branch: &Branch, role: StaffRole) -> StaffMember {
    StaffMember {
        id: Uuid::new_v4(),
        organization: OrganizationSnapshot {
            id: organization.id,
            name: organization.name.clone(),
        },
        branches: vec![BranchMembership {
            id: branch.id,
            name: branch.name.clone(),
            address: branch.address.clone(),
        }],
        first_name: "Test".to_string(),
        last_name: "Staffer".to_string(),
        email: format!("{}@{}.test", Uuid::new_v4().simple(), organization.name),
        password_hash: String::new(),
        session_token: None,
        role,
        is_active: true,
        username: None,
        specialty: None,
        description: None,
        photo_url: None,
    }
}
