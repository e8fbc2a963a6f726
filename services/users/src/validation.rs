//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{CreateUserRequest, UpdateUserRequest};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 255;
const EMAIL_MAX_CHARS: usize = 255;
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 128;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    let len = username.chars().count();
    if len < USERNAME_MIN_CHARS {
        return Err(format!(
            "Username must be at least {} characters long",
            USERNAME_MIN_CHARS
        ));
    }

    if len > USERNAME_MAX_CHARS {
        return Err(format!(
            "Username must be at most {} characters long",
            USERNAME_MAX_CHARS
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(format!(
            "Email must be at most {} characters long",
            EMAIL_MAX_CHARS
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(format!(
            "Password must be at least {} characters long",
            PASSWORD_MIN_CHARS
        ));
    }

    if len > PASSWORD_MAX_CHARS {
        return Err(format!(
            "Password must be at most {} characters long",
            PASSWORD_MAX_CHARS
        ));
    }

    Ok(())
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl UpdateUserRequest {
    /// Only the fields present in the request are checked
    pub fn validate(&self) -> Result<(), String> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"x".repeat(255)).is_ok());
        assert!(validate_username(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_username_counts_characters_not_bytes() {
        assert!(validate_username("éé").is_err());
        assert!(validate_username("ééé").is_ok());
    }

    #[test]
    fn test_email_format() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("a@@x.com").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("").is_err());
        assert!(validate_password("short12").is_err());
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let mut req = CreateUserRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "longenough1".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(req.validate().is_ok());

        req.email = "nope".to_string();
        assert_eq!(req.validate(), Err("Invalid email format".to_string()));
    }

    #[test]
    fn test_update_request_validates_present_fields_only() {
        assert!(UpdateUserRequest::default().validate().is_ok());

        let req = UpdateUserRequest {
            username: Some("ab".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateUserRequest {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}
