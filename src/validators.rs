/// Input validators for identity fields.
///
/// Length limits double as DoS protection: no field is passed to the
/// credential hasher or the store before it is bounded and well-formed.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_PASSWORD_LENGTH: usize = 128; // bcrypt truncates past 72 bytes anyway

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

/// Validates an email address and returns the trimmed value.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(
            "email".to_string(),
            MIN_EMAIL_LENGTH,
        ));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(
            "email".to_string(),
            MAX_EMAIL_LENGTH,
        ));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a username and returns the trimmed value.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort(
            "username".to_string(),
            MIN_USERNAME_LENGTH,
        ));
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates password length bounds. No strength requirements beyond
/// presence; the upper bound keeps hashing cost flat.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_email() {
        assert!(is_valid_email("alice@example.com").is_ok());
    }

    #[test]
    fn trims_email_whitespace() {
        assert_eq!(
            is_valid_email("  alice@example.com ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["notanemail", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "should reject {}", email);
        }
    }

    #[test]
    fn rejects_empty_email() {
        assert!(matches!(
            is_valid_email("   "),
            Err(ValidationError::EmptyField(_))
        ));
    }

    #[test]
    fn accepts_valid_username() {
        assert!(is_valid_username("alice_01").is_ok());
    }

    #[test]
    fn rejects_short_username() {
        assert!(matches!(
            is_valid_username("al"),
            Err(ValidationError::TooShort(_, _))
        ));
    }

    #[test]
    fn rejects_username_with_spaces() {
        assert!(matches!(
            is_valid_username("alice smith"),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_empty_password() {
        assert!(matches!(
            is_valid_password(""),
            Err(ValidationError::EmptyField(_))
        ));
    }

    #[test]
    fn rejects_oversized_password() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(is_valid_password(&long).is_err());
    }

    #[test]
    fn accepts_short_password() {
        assert!(is_valid_password("secret").is_ok());
    }
}
