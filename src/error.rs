/// Unified Error Handling Module
///
/// This module provides a single error taxonomy for the whole service:
/// 1. Validation errors (bad or duplicate identity fields)
/// 2. Authentication errors (uniform external shape, internal cause logged)
/// 3. Authorization errors (role mismatch)
/// 4. Infrastructure errors (store and crypto failures, opaque outward)

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    Duplicate(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::Duplicate(field) => write!(f, "{} already taken", field),
        }
    }
}

impl StdError for ValidationError {}

/// Persistence errors
#[derive(Debug)]
pub enum StoreError {
    UniqueConstraintViolation(String),
    ConnectionPool(String),
    QueryExecution(String),
    UnexpectedError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueConstraintViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::ConnectionPool(msg) => write!(f, "Store connection error: {}", msg),
            StoreError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            StoreError::UnexpectedError(msg) => write!(f, "Store error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Internal reason a credential was rejected.
///
/// Never shown to the caller. Every variant renders externally as the
/// uniform "invalid credential" outcome so the response does not reveal
/// which check failed; the cause exists for server-side logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    MissingToken,
    BadToken,
    UnknownIdentity,
    WrongPassword,
    StaleRefresh,
}

impl fmt::Display for CredentialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialFailure::MissingToken => write!(f, "no token present"),
            CredentialFailure::BadToken => write!(f, "token failed verification"),
            CredentialFailure::UnknownIdentity => write!(f, "subject not found"),
            CredentialFailure::WrongPassword => write!(f, "password mismatch"),
            CredentialFailure::StaleRefresh => write!(f, "refresh secret mismatch"),
        }
    }
}

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    /// Any failed credential check. The cause field is internal-only.
    InvalidCredential { cause: CredentialFailure },
    /// Valid identity, insufficient role.
    InsufficientPrivileges,
    /// The signer could not produce a token pair.
    IssuanceFailed,
}

impl AuthError {
    pub fn invalid(cause: CredentialFailure) -> Self {
        AuthError::InvalidCredential { cause }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredential { .. } => write!(f, "invalid credential"),
            AuthError::InsufficientPrivileges => write!(f, "insufficient privileges"),
            AuthError::IssuanceFailed => write!(f, "token issuance failed"),
        }
    }
}

impl StdError for AuthError {}

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Store(StoreError),
    Auth(AuthError),
    Config(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            StoreError::UniqueConstraintViolation(error_msg)
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            StoreError::ConnectionPool(error_msg)
        } else {
            StoreError::QueryExecution(error_msg)
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn response_parts(&self) -> (StatusCode, String, String) {
        match self {
            AppError::Validation(e) => match e {
                ValidationError::Duplicate(_) => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_FIELD".to_string(),
                    e.to_string(),
                ),
                _ => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR".to_string(),
                    e.to_string(),
                ),
            },
            AppError::Store(e) => match e {
                StoreError::ConnectionPool(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE".to_string(),
                    "Store temporarily unavailable".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR".to_string(),
                    "Store error occurred".to_string(),
                ),
            },
            AppError::Auth(e) => match e {
                AuthError::InvalidCredential { .. } => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIAL".to_string(),
                    "invalid credential".to_string(),
                ),
                AuthError::InsufficientPrivileges => (
                    StatusCode::FORBIDDEN,
                    "INSUFFICIENT_PRIVILEGES".to_string(),
                    "insufficient privileges".to_string(),
                ),
                AuthError::IssuanceFailed => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ISSUANCE_FAILED".to_string(),
                    "Internal server error".to_string(),
                ),
            },
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR".to_string(),
                "Server configuration error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Store(e) => {
                tracing::error!(error_id = error_id, error = %e, "Store error");
            }
            AppError::Auth(AuthError::InvalidCredential { cause }) => {
                tracing::warn!(error_id = error_id, cause = %cause, "Credential rejected");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authorization error");
            }
            AppError::Config(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let (status, code, message) = self.response_parts();
        let body = ErrorResponse::new(error_id, message, code, status.as_u16());

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.response_parts().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn credential_rejections_render_uniformly() {
        let causes = [
            CredentialFailure::MissingToken,
            CredentialFailure::BadToken,
            CredentialFailure::UnknownIdentity,
            CredentialFailure::StaleRefresh,
        ];
        for cause in causes {
            let err = AppError::Auth(AuthError::invalid(cause));
            assert_eq!(err.to_string(), "invalid credential");
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn privilege_rejection_is_distinct() {
        let err = AppError::Auth(AuthError::InsufficientPrivileges);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "insufficient privileges");
    }

    #[test]
    fn duplicate_field_maps_to_conflict() {
        let err = AppError::Validation(ValidationError::Duplicate("email".to_string()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn issuance_failure_is_server_error() {
        let err = AppError::Auth(AuthError::IssuanceFailed);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
