//! JWT issuance and verification for the staff token system.
//!
//! Two kinds of token exist, signed with disjoint secrets:
//!
//! - **Access tokens** carry `{ email, role, organization_id }` and are
//!   what the authorization middleware consumes.
//! - **Refresh tokens** carry `{ email, organization_id }` and are only
//!   accepted by the refresh flow.
//!
//! Because the secrets differ, neither kind of token can ever pass the
//! other verifier; there is no type claim to forget to check.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{BooklineError, Result};
use crate::staff::StaffRole;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub email: String,
    pub role: StaffRole,
    pub organization_id: Uuid,
    /// Expiration time (unix timestamp)
    pub exp: i64,
    /// Issued at (unix timestamp)
    pub iat: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub email: String,
    pub organization_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Issue an access token for the given staff identity.
    pub fn issue_access(
        &self,
        email: &str,
        role: StaffRole,
        organization_id: Uuid,
    ) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessClaims {
            email: email.to_string(),
            role,
            organization_id,
            exp: now + self.access_ttl_secs,
            iat: now,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| BooklineError::internal(format!("Failed to encode access token: {}", e)))
    }

    /// Issue a refresh token for the given staff identity.
    pub fn issue_refresh(&self, email: &str, organization_id: Uuid) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            email: email.to_string(),
            organization_id,
            exp: now + self.refresh_ttl_secs,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding,
        )
        .map_err(|e| BooklineError::internal(format!("Failed to encode refresh token: {}", e)))
    }

    /// Verify an access token and return its claims.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Verify a refresh token and return its claims.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp"]);
    validation
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> BooklineError {
    match err.kind() {
        ErrorKind::ExpiredSignature => BooklineError::authentication("Token expired"),
        ErrorKind::InvalidSignature => BooklineError::authentication("Invalid token signature"),
        _ => BooklineError::authentication(format!("Invalid token: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn service() -> TokenService {
        TokenService::new(&AuthConfig {
            access_secret: "access-secret-at-least-32-bytes!".into(),
            refresh_secret: "refresh-secret-at-least-32-byte!".into(),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 7200,
            min_password_length: 8,
        })
    }

    #[test]
    fn test_access_round_trip() {
        let svc = service();
        let org = Uuid::new_v4();
        let token = svc
            .issue_access("ada@acme.test", StaffRole::Manager, org)
            .unwrap();

        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.email, "ada@acme.test");
        assert_eq!(claims.role, StaffRole::Manager);
        assert_eq!(claims.organization_id, org);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_round_trip() {
        let svc = service();
        let org = Uuid::new_v4();
        let token = svc.issue_refresh("ada@acme.test", org).unwrap();

        let claims = svc.verify_refresh(&token).unwrap();
        assert_eq!(claims.email, "ada@acme.test");
        assert_eq!(claims.organization_id, org);
    }

    #[test]
    fn test_secrets_are_disjoint() {
        let svc = service();
        let org = Uuid::new_v4();

        // A refresh token must never pass the access verifier, and vice versa
        let refresh = svc.issue_refresh("ada@acme.test", org).unwrap();
        assert!(svc.verify_access(&refresh).is_err());

        let access = svc
            .issue_access("ada@acme.test", StaffRole::Employee, org)
            .unwrap();
        assert!(svc.verify_refresh(&access).is_err());
    }

    #[test]
    fn test_expired_token_maps_to_expired_message() {
        let svc = TokenService::new(&AuthConfig {
            access_secret: "access-secret-at-least-32-bytes!".into(),
            refresh_secret: "refresh-secret-at-least-32-byte!".into(),
            access_ttl_secs: -3600,
            refresh_ttl_secs: 7200,
            min_password_length: 8,
        });
        let token = svc
            .issue_access("ada@acme.test", StaffRole::Employee, Uuid::new_v4())
            .unwrap();

        let err = svc.verify_access(&token).unwrap_err();
        assert!(matches!(err, BooklineError::Authentication(_)));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = service();
        assert!(svc.verify_access("not.a.jwt").is_err());
    }
}
