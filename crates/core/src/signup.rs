//! Signup input normalization and validation.
//!
//! Checks run in a fixed order so the first failing rule determines the
//! message shown to the user: missing fields, then password length, then
//! email shape.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum length for email and display name (matches the column widths).
pub const MAX_FIELD_LENGTH: usize = 255;

pub const MISSING_FIELDS_MSG: &str = "Missing required fields";

/// A signup request that passed validation.
///
/// `email` is trimmed and lower-cased; `name` is trimmed. The password is
/// kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate that a password meets the minimum length.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate raw signup fields and produce a [`NewAccount`].
///
/// Absent and blank values are treated the same.
pub fn validate_signup(
    email: Option<&str>,
    password: Option<&str>,
    name: Option<&str>,
) -> Result<NewAccount, CoreError> {
    let email = email.map(normalize_email).unwrap_or_default();
    let name = name.map(|n| n.trim().to_string()).unwrap_or_default();
    let password = password.unwrap_or_default();

    if email.is_empty() || name.is_empty() || password.is_empty() {
        return Err(CoreError::Validation(MISSING_FIELDS_MSG.into()));
    }

    validate_password(password)?;

    if email.len() > MAX_FIELD_LENGTH || !email.validate_email() {
        return Err(CoreError::Validation("Invalid email address".into()));
    }

    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_FIELD_LENGTH} characters"
        )));
    }

    Ok(NewAccount {
        email,
        name,
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: CoreError) -> String {
        match err {
            CoreError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_input_and_normalizes() {
        let account =
            validate_signup(Some("  Ada@Example.COM "), Some("secret1"), Some(" Ada ")).unwrap();
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.name, "Ada");
        assert_eq!(account.password, "secret1");
    }

    #[test]
    fn missing_fields_are_reported_first() {
        let err = validate_signup(None, Some("x"), Some("Ada")).unwrap_err();
        assert_eq!(message(err), MISSING_FIELDS_MSG);

        let err = validate_signup(Some("a@b.co"), Some(""), Some("Ada")).unwrap_err();
        assert_eq!(message(err), MISSING_FIELDS_MSG);

        let err = validate_signup(Some("a@b.co"), Some("secret1"), Some("   ")).unwrap_err();
        assert_eq!(message(err), MISSING_FIELDS_MSG);
    }

    #[test]
    fn short_password_is_rejected() {
        let err = validate_signup(Some("a@b.co"), Some("12345"), Some("Ada")).unwrap_err();
        assert!(message(err).contains("at least 6 characters"));
    }

    #[test]
    fn password_at_minimum_length_passes() {
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // Five characters, ten bytes.
        assert!(validate_password("ééééé").is_err());
        assert!(validate_password("éééééé").is_ok());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = validate_signup(Some("not-an-email"), Some("secret1"), Some("Ada")).unwrap_err();
        assert_eq!(message(err), "Invalid email address");
    }
}
