/// Credential hashing and verification.
///
/// One bcrypt surface for both passwords and refresh-token secrets. The
/// cost factor is fixed at 10 to keep sign-in and refresh latency
/// predictable.
///
/// bcrypt only reads the first 72 bytes of its input. Passwords are
/// capped well under that by validation, but token secrets are signed
/// JWTs several hundred bytes long whose leading bytes (header plus the
/// start of the payload) repeat across issuances for the same subject.
/// Token secrets are therefore reduced to a SHA-256 hex digest before
/// bcrypt, so the whole token contributes to the stored hash.

use sha2::{Digest, Sha256};

use crate::error::AppError;

const HASH_COST: u32 = 10;

/// Hash a secret with bcrypt.
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    bcrypt::hash(secret, HASH_COST)
        .map_err(|e| AppError::Internal(format!("Secret hashing failed: {}", e)))
}

/// Hash a token secret: SHA-256 digest first, then bcrypt.
pub fn hash_token_secret(token: &str) -> Result<String, AppError> {
    hash_secret(&digest_token(token))
}

/// Verify a token secret against a hash produced by `hash_token_secret`.
pub fn verify_token_secret(token: &str, hashed: &str) -> bool {
    verify_secret(&digest_token(token), hashed)
}

fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a secret against a stored hash.
///
/// A malformed hash counts as a mismatch rather than an error, so a
/// corrupted stored value degrades to a rejected credential.
pub fn verify_secret(secret: &str, hashed: &str) -> bool {
    match bcrypt::verify(secret, hashed) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "Secret verification against malformed hash");
            false
        }
    }
}
