//! Integration tests for organization creation and branch quotas.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use bookline::organizations::{
    BranchManager, NewBranch, NewOrganization, OrganizationManager, OrganizationUpdate,
};
use bookline::tenancy::{SchemaMigrator, TenantProvisioner};
use bookline::testing::{
    InMemoryBranchStore, InMemoryOrganizationStore, InMemoryOwnerStore, InMemoryTenantEngine,
};
use bookline::BooklineError;

struct Setup {
    engine: Arc<InMemoryTenantEngine>,
    organizations: Arc<InMemoryOrganizationStore>,
    manager: OrganizationManager,
    branch_manager: BranchManager,
    owner_id: Uuid,
}

fn setup() -> Setup {
    let engine = Arc::new(InMemoryTenantEngine::new());
    let organizations = Arc::new(InMemoryOrganizationStore::new());
    let branches = Arc::new(InMemoryBranchStore::new());
    let owners = Arc::new(InMemoryOwnerStore::new());

    let owner_id = Uuid::new_v4();
    owners.add(owner_id);

    let provisioner = Arc::new(TenantProvisioner::new(engine.clone(), SchemaMigrator::base()));
    let manager = OrganizationManager::new(organizations.clone(), owners.clone(), provisioner);
    let branch_manager = BranchManager::new(branches.clone(), organizations.clone());

    Setup {
        engine,
        organizations,
        manager,
        branch_manager,
        owner_id,
    }
}

fn new_organization(setup: &Setup, name: &str, quota: u32) -> NewOrganization {
    NewOrganization {
        name: name.to_string(),
        owner_id: setup.owner_id,
        branch_quota: quota,
        paid_through: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
    }
}

fn new_branch(organization_id: Uuid, name: &str) -> NewBranch {
    NewBranch {
        organization_id,
        name: name.to_string(),
        phone: "+1 555 0100".into(),
        address: format!("{} street 1", name),
        timezone: "Europe/London".into(),
    }
}

#[tokio::test]
async fn create_provisions_tenant_then_persists_row() {
    let s = setup();
    let organization = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap();

    assert!(organization.is_active);
    assert!(s.engine.database_exists("acme"));
    // Base schema fully applied
    assert!(!s.engine.applied_versions("acme").unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_name_fails_before_any_provisioning() {
    let s = setup();
    s.manager.create(new_organization(&s, "acme", 3)).await.unwrap();

    let err = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap_err();
    assert!(matches!(err, BooklineError::Conflict(_)));
    // The existing tenant database is untouched
    assert!(s.engine.database_exists("acme"));
}

#[tokio::test]
async fn unknown_owner_fails_before_any_provisioning() {
    let s = setup();
    let input = NewOrganization {
        owner_id: Uuid::new_v4(),
        ..new_organization(&s, "acme", 3)
    };

    let err = s.manager.create(input).await.unwrap_err();
    assert!(matches!(err, BooklineError::NotFound(_)));
    assert!(!s.engine.database_exists("acme"));
}

#[tokio::test]
async fn provisioning_failure_leaves_no_organization() {
    let s = setup();
    s.engine.fail_sql_containing("appointments");

    let err = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap_err();

    assert!(matches!(err, BooklineError::Provisioning(_)));
    assert!(!s.engine.database_exists("acme"));
    use bookline::organizations::OrganizationStore;
    assert!(s.organizations.find_by_name("acme").await.unwrap().is_none());
}

#[tokio::test]
async fn zero_quota_is_invalid() {
    let s = setup();
    let err = s.manager.create(new_organization(&s, "acme", 0)).await.unwrap_err();
    assert!(matches!(err, BooklineError::Validation(_)));
}

#[tokio::test]
async fn branch_quota_is_strict() {
    let s = setup();
    let organization = s.manager.create(new_organization(&s, "acme", 2)).await.unwrap();

    s.branch_manager.create(new_branch(organization.id, "Downtown")).await.unwrap();
    s.branch_manager.create(new_branch(organization.id, "Uptown")).await.unwrap();

    let err = s
        .branch_manager
        .create(new_branch(organization.id, "Midtown"))
        .await
        .unwrap_err();

    assert!(matches!(err, BooklineError::Conflict(_)));
    assert!(err.to_string().contains("can have only 2 branches"));
    assert_eq!(s.branch_manager.list(organization.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn raising_the_quota_unblocks_branch_creation() {
    let s = setup();
    let organization = s.manager.create(new_organization(&s, "acme", 1)).await.unwrap();
    s.branch_manager.create(new_branch(organization.id, "Downtown")).await.unwrap();

    assert!(s
        .branch_manager
        .create(new_branch(organization.id, "Uptown"))
        .await
        .is_err());

    s.manager
        .patch(
            organization.id,
            OrganizationUpdate {
                branch_quota: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    s.branch_manager.create(new_branch(organization.id, "Uptown")).await.unwrap();
}

#[tokio::test]
async fn deactivated_organization_rejects_new_branches() {
    let s = setup();
    let organization = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap();
    s.manager.deactivate(organization.id).await.unwrap();

    let err = s
        .branch_manager
        .create(new_branch(organization.id, "Downtown"))
        .await
        .unwrap_err();
    assert!(matches!(err, BooklineError::Validation(_)));
}

#[tokio::test]
async fn name_patch_rechecks_uniqueness() {
    let s = setup();
    let acme = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap();
    s.manager.create(new_organization(&s, "globex", 3)).await.unwrap();

    let err = s
        .manager
        .patch(
            acme.id,
            OrganizationUpdate {
                name: Some("globex".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BooklineError::Conflict(_)));
}

#[tokio::test]
async fn branch_deactivation_keeps_the_row() {
    let s = setup();
    let organization = s.manager.create(new_organization(&s, "acme", 3)).await.unwrap();
    let branch = s
        .branch_manager
        .create(new_branch(organization.id, "Downtown"))
        .await
        .unwrap();

    let branch = s.branch_manager.deactivate(branch.id).await.unwrap();
    assert!(!branch.is_active);
    assert_eq!(s.branch_manager.list(organization.id).await.unwrap().len(), 1);
}
