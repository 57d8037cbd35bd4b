//! Integration tests for the staff authorization model.
//!
//! Exercises the full chain: login issues and stores tokens, the
//! middleware enforces the stored-token match, role gates and the
//! organization-scope check run behind it.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use bookline::auth::{
    PasswordConfig, PasswordHasher, SessionService, StaffAuthState, TokenService,
    authorize_roles, check_organization_access,
};
use bookline::staff::{StaffRole, StaffStore};
use bookline::testing::{fixtures, InMemoryStaffStore};
use bookline::{AuthConfig, BooklineError};

fn auth_config() -> AuthConfig {
    AuthConfig {
        access_secret: "access-secret-at-least-32-bytes!".into(),
        refresh_secret: "refresh-secret-at-least-32-byte!".into(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 7200,
        min_password_length: 8,
    }
}

struct Setup {
    staff: Arc<InMemoryStaffStore>,
    tokens: TokenService,
    sessions: SessionService,
    staff_id: Uuid,
    organization_id: Uuid,
}

async fn setup_with_role(role: StaffRole) -> Setup {
    let staff = Arc::new(InMemoryStaffStore::new());
    let hasher = PasswordHasher::new(PasswordConfig::fast());
    let tokens = TokenService::new(&auth_config());

    let organization = fixtures::organization("acme");
    let branch = fixtures::branch(organization.id, "Downtown");
    let mut member = fixtures::staff_member(&organization, &branch, role);
    member.email = "ada@acme.test".into();
    member.password_hash = hasher.hash("a-long-password").unwrap();
    let staff_id = member.id;
    staff.insert(member).await.unwrap();

    let sessions = SessionService::new(staff.clone(), tokens.clone(), hasher, 8);

    Setup {
        staff,
        tokens,
        sessions,
        staff_id,
        organization_id: organization.id,
    }
}

async fn setup() -> Setup {
    setup_with_role(StaffRole::Employee).await
}

/// A protected router: auth middleware plus optional extra layers.
fn protected_router(setup: &Setup) -> Router {
    let auth = Arc::new(StaffAuthState::new(
        setup.tokens.clone(),
        setup.staff.clone(),
    ));
    Router::new()
        .route("/me", get(|| async { "ok" }))
        .layer(middleware::from_fn(move |req, next| {
            let auth = auth.clone();
            async move { auth.middleware(req, next).await }
        }))
}

fn bearer(token: &str) -> Request<Body> {
    Request::builder()
        .uri("/me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn login_then_access_protected_route() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    let response = protected_router(&s).oneshot(bearer(&outcome.access_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_identical() {
    let s = setup().await;

    let e1 = s.sessions.login("nobody@acme.test", "whatever").await.unwrap_err();
    let e2 = s.sessions.login("ada@acme.test", "wrong-password").await.unwrap_err();

    assert_eq!(e1.to_string(), e2.to_string());
    assert!(matches!(e1, BooklineError::Authentication(_)));
}

#[tokio::test]
async fn inactive_account_cannot_login_even_with_correct_password() {
    let s = setup().await;
    let mut member = s.staff.find_by_id(s.staff_id).await.unwrap().unwrap();
    member.is_active = false;
    s.staff.update(member).await.unwrap();

    let err = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap_err();
    assert!(matches!(err, BooklineError::Authorization(_)));
}

#[tokio::test]
async fn logout_revokes_the_access_token() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();
    let router = protected_router(&s);

    s.sessions.logout(s.staff_id).await.unwrap();

    // The token still verifies cryptographically but the stored-token
    // match fails
    let response = router.oneshot(bearer(&outcome.access_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn relogin_revokes_the_previous_token() {
    let s = setup().await;
    let first = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();
    let second = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    let router = protected_router(&s);
    let old = router.clone().oneshot(bearer(&first.access_token)).await.unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let current = router.oneshot(bearer(&second.access_token)).await.unwrap();
    assert_eq!(current.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rotates_the_stored_token() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    let new_access = s.sessions.refresh(&outcome.refresh_token).await.unwrap();
    let router = protected_router(&s);

    let old = router.clone().oneshot(bearer(&outcome.access_token)).await.unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let fresh = router.oneshot(bearer(&new_access)).await.unwrap();
    assert_eq!(fresh.status(), StatusCode::OK);
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    // Disjoint secrets: the access token must fail the refresh verifier
    let err = s.sessions.refresh(&outcome.access_token).await.unwrap_err();
    assert!(matches!(err, BooklineError::Authentication(_)));
}

#[tokio::test]
async fn change_password_kills_the_session() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    s.sessions
        .change_password(s.staff_id, "a-long-password", "another-long-password")
        .await
        .unwrap();

    let response = protected_router(&s).oneshot(bearer(&outcome.access_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // And the new password works
    s.sessions.login("ada@acme.test", "another-long-password").await.unwrap();
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let s = setup().await;
    let err = s
        .sessions
        .change_password(s.staff_id, "wrong", "another-long-password")
        .await
        .unwrap_err();
    assert!(matches!(err, BooklineError::Authentication(_)));
}

#[tokio::test]
async fn missing_and_garbage_tokens_are_unauthorized() {
    let s = setup().await;
    let router = protected_router(&s);

    let no_header = Request::builder().uri("/me").body(Body::empty()).unwrap();
    let response = router.clone().oneshot(no_header).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router.oneshot(bearer("not.a.jwt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_account_is_forbidden_mid_session() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    let mut member = s.staff.find_by_id(s.staff_id).await.unwrap().unwrap();
    member.is_active = false;
    s.staff.update(member).await.unwrap();

    let response = protected_router(&s).oneshot(bearer(&outcome.access_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manager_only_route_rejects_employees() {
    let s = setup_with_role(StaffRole::Employee).await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();

    let auth = Arc::new(StaffAuthState::new(s.tokens.clone(), s.staff.clone()));
    let router = Router::new()
        .route("/admin", get(|| async { "ok" }))
        .layer(middleware::from_fn(|req, next| {
            authorize_roles(&[StaffRole::Manager], req, next)
        }))
        .layer(middleware::from_fn(move |req, next| {
            let auth = auth.clone();
            async move { auth.middleware(req, next).await }
        }));

    let request = Request::builder()
        .uri("/admin")
        .header("Authorization", format!("Bearer {}", outcome.access_token))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

fn org_scoped_router(setup: &Setup) -> Router {
    let auth = Arc::new(StaffAuthState::new(
        setup.tokens.clone(),
        setup.staff.clone(),
    ));
    Router::new()
        .route("/scoped", post(|| async { "ok" }))
        .layer(middleware::from_fn(check_organization_access))
        .layer(middleware::from_fn(move |req, next| {
            let auth = auth.clone();
            async move { auth.middleware(req, next).await }
        }))
}

#[tokio::test]
async fn organization_scope_checks_query_parameter() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();
    let router = org_scoped_router(&s);

    let own = Request::builder()
        .method("POST")
        .uri(format!("/scoped?organizationId={}", s.organization_id))
        .header("Authorization", format!("Bearer {}", outcome.access_token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(router.clone().oneshot(own).await.unwrap().status(), StatusCode::OK);

    let foreign = Request::builder()
        .method("POST")
        .uri(format!("/scoped?organizationId={}", Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", outcome.access_token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        router.oneshot(foreign).await.unwrap().status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn organization_scope_checks_json_body() {
    let s = setup().await;
    let outcome = s.sessions.login("ada@acme.test", "a-long-password").await.unwrap();
    let router = org_scoped_router(&s);

    let foreign_body = json!({ "organization": { "id": Uuid::new_v4() } });
    let request = Request::builder()
        .method("POST")
        .uri("/scoped")
        .header("Authorization", format!("Bearer {}", outcome.access_token))
        .header("Content-Type", "application/json")
        .body(Body::from(foreign_body.to_string()))
        .unwrap();
    assert_eq!(
        router.clone().oneshot(request).await.unwrap().status(),
        StatusCode::FORBIDDEN
    );

    // A body naming no organization passes through
    let request = Request::builder()
        .method("POST")
        .uri("/scoped")
        .header("Authorization", format!("Bearer {}", outcome.access_token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "name": "x" }).to_string()))
        .unwrap();
    assert_eq!(router.oneshot(request).await.unwrap().status(), StatusCode::OK);
}
