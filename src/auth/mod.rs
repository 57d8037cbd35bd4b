//! Staff authentication and authorization.
//!
//! Two-secret JWT issuance ([`TokenService`]), Argon2id password handling
//! ([`PasswordHasher`]), session flows with server-side revocation
//! ([`SessionService`]), and the request middleware chain
//! ([`StaffAuthState`], [`authorize_roles`], [`check_organization_access`]).

pub mod extract;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

pub use extract::extract_bearer_token;
pub use middleware::{
    AuthenticatedStaff, StaffAuthState, authenticated_staff, authorize_roles,
    check_organization_access,
};
pub use password::{PasswordConfig, PasswordHasher};
pub use session::{LoginOutcome, SessionService};
pub use token::{AccessClaims, RefreshClaims, TokenService};
