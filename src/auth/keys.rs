/// RSA key material for token signing and verification.
///
/// Two independent key pairs are loaded, one per token kind, so a party
/// holding the access public key cannot forge or validate refresh tokens
/// and vice versa. Keys arrive base64-encoded PEM in configuration and
/// are decoded exactly once, at startup; the resulting structure is
/// immutable and passed explicitly to the signer.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::configuration::AuthSettings;
use crate::error::AppError;

/// Which of the two key pairs a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry_minutes: i64,
    refresh_expiry_minutes: i64,
}

fn decode_pem(name: &str, value: &str) -> Result<Vec<u8>, AppError> {
    BASE64
        .decode(value.trim())
        .map_err(|e| AppError::Config(format!("{} is not valid base64: {}", name, e)))
}

impl TokenKeys {
    /// Decode and parse all four keys. Fails fast so a misconfigured key
    /// is caught at startup rather than on the first request.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AppError> {
        let access_private = decode_pem("access_private_key", &settings.access_private_key)?;
        let access_public = decode_pem("access_public_key", &settings.access_public_key)?;
        let refresh_private = decode_pem("refresh_private_key", &settings.refresh_private_key)?;
        let refresh_public = decode_pem("refresh_public_key", &settings.refresh_public_key)?;

        Ok(Self {
            access_encoding: EncodingKey::from_rsa_pem(&access_private)
                .map_err(|e| AppError::Config(format!("access private key: {}", e)))?,
            access_decoding: DecodingKey::from_rsa_pem(&access_public)
                .map_err(|e| AppError::Config(format!("access public key: {}", e)))?,
            refresh_encoding: EncodingKey::from_rsa_pem(&refresh_private)
                .map_err(|e| AppError::Config(format!("refresh private key: {}", e)))?,
            refresh_decoding: DecodingKey::from_rsa_pem(&refresh_public)
                .map_err(|e| AppError::Config(format!("refresh public key: {}", e)))?,
            access_expiry_minutes: settings.access_token_expiry_minutes,
            refresh_expiry_minutes: settings.refresh_token_expiry_minutes,
        })
    }

    pub(crate) fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    pub(crate) fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }

    pub fn expiry_minutes(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_expiry_minutes,
            TokenKind::Refresh => self.refresh_expiry_minutes,
        }
    }
}
