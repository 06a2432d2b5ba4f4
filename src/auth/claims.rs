/// JWT Claims structure
///
/// Payload carried by both access and refresh tokens: the subject id plus
/// the standard expiry/issued-at claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, CredentialFailure};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token ID, unique per issuance. `iat` has second granularity, so
    /// without this two tokens signed for the same subject in the same
    /// second would be byte-identical and rotation could not tell the
    /// consumed token from its replacement.
    pub jti: String,
}

impl Claims {
    /// Create new claims for a subject, expiring after the given number
    /// of minutes.
    pub fn new(subject: Uuid, expiry_minutes: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: subject.to_string(),
            exp: now + expiry_minutes * 60,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract the subject id from the claims.
    ///
    /// A non-UUID subject is treated like any other bad token.
    pub fn subject(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| {
            AppError::Auth(crate::error::AuthError::invalid(CredentialFailure::BadToken))
        })
    }
}
