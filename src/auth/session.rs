//! Staff session flows: login, logout, refresh, password change.
//!
//! A successful login stores the freshly issued access token on the staff
//! row. Verification later requires an exact match against that stored
//! value, so logout (clearing it) and re-login (overwriting it) both revoke
//! every previously issued access token for the account.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::error::{BooklineError, Result};
use crate::staff::{StaffMember, StaffStore};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub staff: StaffMember,
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates staff authentication flows over a [`StaffStore`].
#[derive(Clone)]
pub struct SessionService {
    staff: Arc<dyn StaffStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
    min_password_length: usize,
}

impl SessionService {
    pub fn new(
        staff: Arc<dyn StaffStore>,
        tokens: TokenService,
        hasher: PasswordHasher,
        min_password_length: usize,
    ) -> Self {
        Self {
            staff,
            tokens,
            hasher,
            min_password_length,
        }
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password produce the same error; a hash is
    /// burned on the unknown-email path so the two take comparable time.
    /// Deactivated accounts are rejected with `Authorization` even when
    /// the credentials are correct.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);

        let Some(mut member) = self.staff.find_by_email(&email).await? else {
            self.hasher.burn(password);
            return Err(BooklineError::authentication(BAD_CREDENTIALS));
        };

        if !member.is_active {
            return Err(BooklineError::authorization("Account is deactivated"));
        }

        if !self.hasher.verify(password, &member.password_hash)? {
            return Err(BooklineError::authentication(BAD_CREDENTIALS));
        }

        let access_token =
            self.tokens
                .issue_access(&member.email, member.role, member.organization.id)?;
        let refresh_token = self
            .tokens
            .issue_refresh(&member.email, member.organization.id)?;

        // Overwrites any previous session; old access tokens die here
        self.staff
            .set_session_token(member.id, Some(access_token.clone()))
            .await?;
        member.session_token = Some(access_token.clone());

        info!(staff_id = %member.id, "Staff member logged in");

        Ok(LoginOutcome {
            staff: member,
            access_token,
            refresh_token,
        })
    }

    /// Clear the stored session token, revoking the current access token.
    #[instrument(skip(self))]
    pub async fn logout(&self, staff_id: Uuid) -> Result<()> {
        self.staff
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Staff member not found"))?;

        self.staff.set_session_token(staff_id, None).await?;
        info!(%staff_id, "Staff member logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The new access token replaces the stored one, so whatever access
    /// token was live before the refresh is revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let member = self
            .staff
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| BooklineError::authentication("Unknown account"))?;

        if !member.is_active {
            return Err(BooklineError::authorization("Account is deactivated"));
        }

        let access_token =
            self.tokens
                .issue_access(&member.email, member.role, member.organization.id)?;
        self.staff
            .set_session_token(member.id, Some(access_token.clone()))
            .await?;

        info!(staff_id = %member.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Change a staff member's password.
    ///
    /// Requires the current password. The stored session token is cleared
    /// so outstanding access tokens die with the old password.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        staff_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut member = self
            .staff
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Staff member not found"))?;

        if !self.hasher.verify(current_password, &member.password_hash)? {
            return Err(BooklineError::authentication("Current password is incorrect"));
        }

        if new_password.len() < self.min_password_length {
            return Err(BooklineError::validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        member.password_hash = self.hasher.hash(new_password)?;
        // Outstanding access tokens die with the old password
        member.session_token = None;
        self.staff.update(member).await?;

        info!(%staff_id, "Password changed");
        Ok(())
    }

    /// Fetch the authenticated staff member's own record.
    pub async fn me(&self, staff_id: Uuid) -> Result<StaffMember> {
        self.staff
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| BooklineError::not_found("Staff member not found"))
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
