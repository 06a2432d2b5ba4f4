/// Token signing, verification, and pair issuance.
///
/// RS256 over the key pair selected by `TokenKind`. Cryptographic
/// failures never escape this module: `sign_token` and `verify_token`
/// log and return `None`, and callers treat `None` as the
/// authentication-failure case.

use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::keys::{TokenKeys, TokenKind};

/// A freshly issued access/refresh token pair for one subject.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign a token of the given kind for a subject.
///
/// Returns `None` (logged) if encoding fails.
pub fn sign_token(keys: &TokenKeys, kind: TokenKind, subject: Uuid) -> Option<String> {
    let claims = Claims::new(subject, keys.expiry_minutes(kind));

    match encode(
        &Header::new(Algorithm::RS256),
        &claims,
        keys.encoding_key(kind),
    ) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::error!(kind = ?kind, error = %e, "Token signing failed");
            None
        }
    }
}

/// Verify a token of the given kind and return its claims.
///
/// Validates the signature against the kind's public key and the `exp`
/// claim. Returns `None` (logged) on signature mismatch, expiry, or a
/// malformed token.
pub fn verify_token(keys: &TokenKeys, kind: TokenKind, token: &str) -> Option<Claims> {
    let validation = Validation::new(Algorithm::RS256);

    match decode::<Claims>(token, keys.decoding_key(kind), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::warn!(kind = ?kind, error = %e, "Token verification failed");
            None
        }
    }
}

/// Issue an access/refresh pair for a subject, each token signed with its
/// own key and expiry. `None` means issuance failed and the caller must
/// surface a server error.
pub fn issue_token_pair(keys: &TokenKeys, subject: Uuid) -> Option<TokenPair> {
    let access_token = sign_token(keys, TokenKind::Access, subject)?;
    let refresh_token = sign_token(keys, TokenKind::Refresh, subject)?;

    Some(TokenPair {
        access_token,
        refresh_token,
    })
}
