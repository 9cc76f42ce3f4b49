//! Input validation for the presentation layer
//!
//! The store assumes well-typed input and never re-validates. Anything that
//! arrives as raw text (CLI arguments, shell lines) goes through these rules
//! first; failures are `UserbookError::MissingField` or
//! `UserbookError::InvalidField`, both classified as `ERR_INVALID_INPUT`.

use crate::errors::{Result, UserbookError};
use crate::model::{User, UserFields};

/// Raw form input for creating or editing a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub email: Option<String>,
}

impl UserForm {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age: age.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Validate the form for a new record
    ///
    /// First name, last name and age are required. Names are trimmed, age
    /// must parse as a non-negative integer and a supplied email must look
    /// like an address. A blank email counts as absent.
    ///
    /// # Errors
    /// `MissingField` for a blank required field, `InvalidField` otherwise.
    pub fn validate(&self) -> Result<UserFields> {
        let first_name = required("first_name", &self.first_name)?;
        let last_name = required("last_name", &self.last_name)?;
        let age = parse_age(&self.age)?;
        let email = self.email.as_deref().map(parse_email).transpose()?.flatten();

        Ok(UserFields {
            first_name: Some(first_name),
            last_name: Some(last_name),
            age,
            email,
            ..UserFields::default()
        })
    }

    /// Apply the form to an existing record
    ///
    /// Names and age are overwritten. The email is replaced only when the
    /// form supplies one; `created_at` and `avatar` are always kept.
    ///
    /// # Errors
    /// Same as [`UserForm::validate`].
    pub fn apply_to(&self, existing: &User) -> Result<User> {
        let validated = self.validate()?;
        let mut updated = existing.clone();
        updated.fields.first_name = validated.first_name;
        updated.fields.last_name = validated.last_name;
        updated.fields.age = validated.age;
        if validated.email.is_some() {
            updated.fields.email = validated.email;
        }
        Ok(updated)
    }
}

fn required(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UserbookError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_age(raw: &str) -> Result<i64> {
    let trimmed = required("age", raw)?;
    let age: i64 = trimmed.parse().map_err(|_| UserbookError::InvalidField {
        field: "age".to_string(),
        reason: format!("'{}' is not a whole number", trimmed),
    })?;
    if age < 0 {
        return Err(UserbookError::InvalidField {
            field: "age".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(age)
}

fn parse_email(raw: &str) -> Result<Option<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(Some(trimmed.to_string()))
        }
        _ => Err(UserbookError::InvalidField {
            field: "email".to_string(),
            reason: format!("'{}' is not an email address", trimmed),
        }),
    }
}

/// Parse a user id typed by a person
///
/// # Errors
/// `MissingField` when blank, `InvalidField` when not a positive integer.
pub fn parse_id(raw: &str) -> Result<i64> {
    let trimmed = required("id", raw)?;
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(UserbookError::InvalidField {
            field: "id".to_string(),
            reason: format!("'{}' is not a positive whole number", trimmed),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_form() {
        let fields = UserForm::new(" John ", "Doe", "30")
            .with_email("john.doe@example.com")
            .validate()
            .unwrap();
        assert_eq!(fields.first_name.as_deref(), Some("John"));
        assert_eq!(fields.age, 30);
        assert_eq!(fields.email.as_deref(), Some("john.doe@example.com"));
        assert!(fields.created_at.is_none());
    }

    #[test]
    fn test_blank_required_fields() {
        for (form, field) in [
            (UserForm::new("", "Doe", "30"), "first_name"),
            (UserForm::new("John", "   ", "30"), "last_name"),
            (UserForm::new("John", "Doe", ""), "age"),
        ] {
            assert_eq!(
                form.validate().unwrap_err(),
                UserbookError::MissingField {
                    field: field.to_string()
                }
            );
        }
    }

    #[test]
    fn test_non_numeric_and_negative_age() {
        assert!(matches!(
            UserForm::new("a", "b", "thirty").validate(),
            Err(UserbookError::InvalidField { ref field, .. }) if field == "age"
        ));
        assert!(matches!(
            UserForm::new("a", "b", "-1").validate(),
            Err(UserbookError::InvalidField { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn test_email_rules() {
        let blank = UserForm::new("a", "b", "1").with_email("  ").validate().unwrap();
        assert!(blank.email.is_none());

        let bad = UserForm::new("a", "b", "1").with_email("nobody").validate();
        assert!(matches!(bad, Err(UserbookError::InvalidField { ref field, .. }) if field == "email"));
    }

    #[test]
    fn test_apply_to_keeps_unsupplied_fields() {
        let existing = User::new(
            1,
            UserFields::new("John", "Doe", 30)
                .with_email("john.doe@example.com")
                .with_created_at(1_700_000_000_000),
        );

        let updated = UserForm::new("John", "Doe", "31").apply_to(&existing).unwrap();

        assert_eq!(updated.id, 1);
        assert_eq!(updated.fields.age, 31);
        assert_eq!(updated.fields.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(updated.fields.created_at, Some(1_700_000_000_000));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 12 ").unwrap(), 12);
        assert!(matches!(parse_id(""), Err(UserbookError::MissingField { .. })));
        assert!(matches!(parse_id("0"), Err(UserbookError::InvalidField { .. })));
        assert!(matches!(parse_id("abc"), Err(UserbookError::InvalidField { .. })));
    }

    proptest! {
        #[test]
        fn prop_any_non_negative_age_round_trips(age in 0i64..=i64::MAX) {
            let fields = UserForm::new("a", "b", age.to_string()).validate().unwrap();
            prop_assert_eq!(fields.age, age);
        }

        #[test]
        fn prop_non_digit_age_is_rejected(raw in "[a-zA-Z]{1,8}") {
            prop_assert!(UserForm::new("a", "b", raw).validate().is_err());
        }
    }
}
