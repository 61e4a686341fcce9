//! Login and registration forms
//!
//! Validation happens before any request is built; a form that fails here
//! never reaches the network.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn is_valid_email(email: &str) -> bool {
    let regex = EMAIL_REGEX.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern"));
    regex.is_match(email)
}

/// Per-field validation messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.email.trim().is_empty() {
            errors.insert("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.name.trim().is_empty() {
            errors.insert("name", "Full name is required");
        }

        if self.email.trim().is_empty() {
            errors.insert("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.insert("email", "Please enter a valid email address");
        }

        if self.password.is_empty() {
            errors.insert("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                "password",
                format!(
                    "Password must be at least {} characters long",
                    MIN_PASSWORD_LEN
                ),
            );
        }

        errors.into_result()
    }
}

/// Inline hint shown under a short, non-empty password
pub fn password_strength_hint(password: &str) -> Option<String> {
    let len = password.chars().count();
    (len > 0 && len < MIN_PASSWORD_LEN)
        .then(|| format!("Password strength: {}/{} characters", len, MIN_PASSWORD_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_needs_both_fields() {
        assert!(LoginForm::new("a@b.com", "x").validate().is_ok());

        let errors = LoginForm::new("  ", "").validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn register_reports_every_field() {
        let errors = RegisterForm::new(" ", "", "").validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("name"), Some("Full name is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn register_checks_email_shape_and_password_length() {
        let errors = RegisterForm::new("A", "not-an-email", "short")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters long")
        );
        assert_eq!(errors.get("name"), None);

        assert!(RegisterForm::new("A", "a@b.com", "longenough1").validate().is_ok());
        assert!(RegisterForm::new("A", "a@b.com", "12345678").validate().is_ok());
    }

    #[test]
    fn strength_hint_only_for_short_passwords() {
        assert_eq!(password_strength_hint(""), None);
        assert_eq!(
            password_strength_hint("short").as_deref(),
            Some("Password strength: 5/8 characters")
        );
        assert_eq!(password_strength_hint("longenough"), None);
    }

    #[test]
    fn display_joins_fields_in_order() {
        let errors = RegisterForm::new("", "a@b.com", "").validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "name: Full name is required; password: Password is required"
        );
    }
}
