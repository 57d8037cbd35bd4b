use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for the bookline core.
///
/// Each variant corresponds to one class in the error taxonomy and maps to
/// a fixed HTTP status. Everything is recovered at the request boundary and
/// translated into a structured JSON body with stable `error`/`message`
/// fields.
#[derive(Debug, thiserror::Error)]
pub enum BooklineError {
    /// Missing or malformed input the caller can fix.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Uniqueness violation: email, organization name, duplicate branch
    /// membership, or a branch quota that is already exhausted.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing organization/branch/staff reference.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad credentials or an invalid/expired/revoked token.
    #[error("Unauthorized: {0}")]
    Authentication(String),

    /// Valid identity, insufficient role or wrong organization scope.
    #[error("Forbidden: {0}")]
    Authorization(String),

    /// Tenant database creation or migration failure. By the time this is
    /// surfaced the compensating rollback has already run.
    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl BooklineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable kind, used as the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Authentication(_) => "authentication_error",
            Self::Authorization(_) => "authorization_error",
            Self::Provisioning(_) => "provisioning_error",
            Self::Database(_) => "database_error",
            Self::Internal(_) | Self::Anyhow(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::Provisioning(_) | Self::Database(_) | Self::Internal(_) | Self::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert to a response, optionally exposing server-side details.
    ///
    /// # Security
    ///
    /// 5xx details are only exposed when `dev_mode` is true. In production
    /// they show a generic message to prevent information disclosure; the
    /// full error is still logged server-side.
    pub fn into_response_with_dev_mode(self, dev_mode: bool) -> Response {
        let status = self.status_code();

        let message = if dev_mode {
            self.to_string()
        } else {
            self.safe_message()
        };

        tracing::error!(
            status = status.as_u16(),
            error = %self,
            "Request failed"
        );

        let body = Json(ErrorResponse {
            error: self.kind(),
            message,
        });

        (status, body).into_response()
    }

    /// Returns a message safe for client responses in production.
    ///
    /// Client errors (4xx) expose their message; server errors (5xx) are
    /// replaced with a generic one.
    fn safe_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Validation failed: {}", msg),
            Self::Conflict(msg) => format!("Conflict: {}", msg),
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::Authentication(msg) => format!("Unauthorized: {}", msg),
            Self::Authorization(msg) => format!("Forbidden: {}", msg),
            Self::Provisioning(_) => "Provisioning failed".to_string(),
            Self::Database(_) => "Database error".to_string(),
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for BooklineError {
    fn into_response(self) -> Response {
        self.into_response_with_dev_mode(false)
    }
}

/// Result type alias for bookline operations.
pub type Result<T> = std::result::Result<T, BooklineError>;

impl From<serde_json::Error> for BooklineError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            BooklineError::Validation(format!("JSON error: {}", err))
        } else {
            BooklineError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<sea_orm::DbErr> for BooklineError {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::RecordNotFound(msg) => BooklineError::NotFound(if msg.is_empty() {
                "Record not found".to_string()
            } else {
                msg.clone()
            }),
            sea_orm::DbErr::Conn(inner) => {
                BooklineError::Database(format!("Connection error: {}", inner))
            }
            sea_orm::DbErr::Exec(inner) => {
                BooklineError::Database(format!("Execution error: {}", inner))
            }
            sea_orm::DbErr::Query(inner) => {
                BooklineError::Database(format!("Query error: {}", inner))
            }
            _ => BooklineError::Database(format!("Database error: {}", err)),
        }
    }
}
