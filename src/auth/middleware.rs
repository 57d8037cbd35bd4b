//! Staff authorization middleware.
//!
//! The chain for a protected route is:
//!
//! 1. [`StaffAuthState::middleware`] verifies the bearer token, resolves the
//!    staff record by email AND stored session token, checks the account is
//!    active, and inserts [`AuthenticatedStaff`] into request extensions.
//! 2. [`authorize_roles`] gates on the authenticated member's role.
//! 3. [`check_organization_access`] compares the caller's organization with
//!    the one named by the request.
//!
//! The exact-match lookup in step 1 is what makes revocation server-side: a
//! cryptographically valid token that is no longer the stored one is dead.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::extract::{extract_bearer_token, query_param};
use crate::auth::token::TokenService;
use crate::error::{BooklineError, Result};
use crate::staff::{StaffMember, StaffRole, StaffStore};

/// The resolved identity of the caller, inserted into request extensions
/// by the authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    pub id: Uuid,
    pub email: String,
    pub role: StaffRole,
    pub organization_id: Uuid,
}

impl From<&StaffMember> for AuthenticatedStaff {
    fn from(member: &StaffMember) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            role: member.role,
            organization_id: member.organization.id,
        }
    }
}

/// Shared state for the staff authentication middleware.
///
/// # Example
///
/// ```rust,ignore
/// let auth = Arc::new(StaffAuthState::new(tokens, staff_store));
/// let protected = Router::new()
///     .route("/staff", get(list_staff))
///     .layer(axum::middleware::from_fn(move |req, next| {
///         let auth = auth.clone();
///         async move { auth.middleware(req, next).await }
///     }));
/// ```
#[derive(Clone)]
pub struct StaffAuthState {
    tokens: TokenService,
    staff: Arc<dyn StaffStore>,
}

impl StaffAuthState {
    pub fn new(tokens: TokenService, staff: Arc<dyn StaffStore>) -> Self {
        Self { tokens, staff }
    }

    /// Middleware function that requires an authenticated, active staff
    /// member carrying their current session token.
    pub async fn middleware(&self, request: Request, next: Next) -> Result<Response> {
        let token = extract_bearer_token(&request)?;

        let claims = self.tokens.verify_access(&token)?;

        // Exact-match against the stored token; a miss means the token was
        // revoked by logout or superseded by a newer login.
        let member = self
            .staff
            .find_by_email_and_token(&claims.email, &token)
            .await?
            .ok_or_else(|| BooklineError::authentication("Session is no longer valid"))?;

        if !member.is_active {
            return Err(BooklineError::authorization("Account is deactivated"));
        }

        debug!(staff_id = %member.id, role = %member.role, "Staff authenticated");

        let mut request = request;
        request
            .extensions_mut()
            .insert(AuthenticatedStaff::from(&member));

        Ok(next.run(request).await)
    }
}

/// Read the authenticated staff identity out of a request's extensions.
///
/// Fails with `Authentication` when the auth middleware did not run.
pub fn authenticated_staff<B>(request: &axum::http::Request<B>) -> Result<AuthenticatedStaff> {
    request
        .extensions()
        .get::<AuthenticatedStaff>()
        .cloned()
        .ok_or_else(|| BooklineError::authentication("Not authenticated"))
}

/// Role-gating middleware factory.
///
/// ```rust,ignore
/// .layer(axum::middleware::from_fn(|req, next| {
///     authorize_roles(&[StaffRole::Manager], req, next)
/// }))
/// ```
pub async fn authorize_roles(
    allowed: &[StaffRole],
    request: Request,
    next: Next,
) -> Result<Response> {
    let staff = authenticated_staff(&request)?;

    if !allowed.contains(&staff.role) {
        return Err(BooklineError::authorization(format!(
            "Role '{}' is not permitted for this operation",
            staff.role
        )));
    }

    Ok(next.run(request).await)
}

/// Organization-scope middleware.
///
/// The target organization id is read from the `organizationId` query
/// parameter, or from `organization.id` inside a JSON body. A request that
/// names a different organization than the caller's is rejected with
/// `Authorization`. Requests naming no organization pass through; the
/// handler's own queries are already scoped by the caller's organization.
pub async fn check_organization_access(request: Request, next: Next) -> Result<Response> {
    let staff = authenticated_staff(&request)?;

    if let Some(raw) = query_param(&request, "organizationId") {
        let target = parse_org_id(&raw)?;
        require_same_org(&staff, target)?;
        return Ok(next.run(request).await);
    }

    // The body can only be read once; buffer it, inspect, and rebuild the
    // request so the handler still sees the full body.
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| BooklineError::internal(format!("Failed to buffer request body: {}", e)))?;

    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) {
        if let Some(id) = json
            .get("organization")
            .and_then(|org| org.get("id"))
            .and_then(|id| id.as_str())
        {
            let target = parse_org_id(id)?;
            require_same_org(&staff, target)?;
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

fn parse_org_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|_| BooklineError::validation(format!("Invalid organization id: {}", raw)))
}

fn require_same_org(staff: &AuthenticatedStaff, target: Uuid) -> Result<()> {
    if staff.organization_id != target {
        return Err(BooklineError::authorization(
            "Access denied to this organization",
        ));
    }
    Ok(())
}
