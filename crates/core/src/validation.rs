//! Field validation helpers shared by the domain crates.
//!
//! Every failure is a [`DomainError::Validation`] carrying the exact message
//! that is returned to API clients.

use chrono::{DateTime, Utc};

use crate::error::{DomainError, DomainResult};

/// Largest accepted image upload (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Accepted image file extensions (lowercase, with the dot).
pub const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Unwrap a required field or fail with `"{field} is required"`.
pub fn required<T>(field: &str, value: Option<T>) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

/// Check the character count of `value` against an inclusive range.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} can not be longer than {max} characters"
        )));
    }
    Ok(())
}

/// Same as [`check_length`] but skips absent values (partial updates).
pub fn check_length_opt(field: &str, value: Option<&str>, min: usize, max: usize) -> DomainResult<()> {
    match value {
        Some(v) => check_length(field, v, min, max),
        None => Ok(()),
    }
}

pub fn check_non_negative(field: &str, value: i32) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} can not be negative")));
    }
    Ok(())
}

/// Email: 3..=100 characters, one `@` with a non-empty local part and a
/// dotted domain without whitespace.
pub fn check_email(value: &str) -> DomainResult<()> {
    let len = value.chars().count();
    if len > 100 {
        return Err(DomainError::validation(
            "Email address can not be longer than 100 characters",
        ));
    }
    if len < 3 || !is_well_formed_email(value) {
        return Err(DomainError::validation("Please enter a valid email address"));
    }
    Ok(())
}

fn is_well_formed_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|part| !part.is_empty())
}

pub fn check_password(value: &str) -> DomainResult<()> {
    let len = value.chars().count();
    if len < 8 {
        return Err(DomainError::validation("Password must be at least 8 characters"));
    }
    if len > 255 {
        return Err(DomainError::validation(
            "Password can not be longer than 255 characters",
        ));
    }
    Ok(())
}

pub fn check_not_future(field: &str, value: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
    if value > now {
        return Err(DomainError::validation(format!("{field} can not be in the future")));
    }
    Ok(())
}

/// Validate an uploaded image by file name and size.
pub fn check_image(file_name: &str, size: usize) -> DomainResult<()> {
    if image_extension(file_name).is_none() {
        return Err(DomainError::validation(
            "You can only upload .png .jpg or .jpeg images",
        ));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(image_too_large());
    }
    Ok(())
}

pub fn image_too_large() -> DomainError {
    DomainError::validation(format!("Maximum allowed file size is {MAX_IMAGE_BYTES} bytes."))
}

/// Lowercased extension (with the dot) if it is an accepted image type.
pub fn image_extension(file_name: &str) -> Option<&'static str> {
    let dot = file_name.rfind('.')?;
    let ext = file_name[dot..].to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn length_messages_match_field_label() {
        let err = check_length("Name", "a", 2, 50).unwrap_err();
        assert_eq!(err.to_string(), "Name must be at least 2 characters");

        let long = "x".repeat(51);
        let err = check_length("City", &long, 2, 50).unwrap_err();
        assert_eq!(err.to_string(), "City can not be longer than 50 characters");
    }

    #[test]
    fn required_reports_missing_field() {
        let err = required::<i32>("Dateofbirth", None).unwrap_err();
        assert_eq!(err.to_string(), "Dateofbirth is required");
        assert_eq!(required("Name", Some(3)).unwrap(), 3);
    }

    #[test]
    fn email_shape() {
        assert!(check_email("pete@mail.com").is_ok());
        assert!(check_email("pete@mail").is_err());
        assert!(check_email("@mail.com").is_err());
        assert!(check_email("pe te@mail.com").is_err());
        assert!(check_email("a@b@c.com").is_err());
        assert!(check_email("pete@.com").is_err());
    }

    #[test]
    fn future_dates_rejected() {
        let now = Utc::now();
        assert!(check_not_future("Dateofbirth", now - Duration::days(1), now).is_ok());
        let err = check_not_future("Dateofbirth", now + Duration::days(1), now).unwrap_err();
        assert_eq!(err.to_string(), "Dateofbirth can not be in the future");
    }

    #[test]
    fn image_checks() {
        assert!(check_image("photo.JPG", 10).is_ok());
        assert!(check_image("photo.png", MAX_IMAGE_BYTES).is_ok());
        assert_eq!(
            check_image("photo.gif", 10).unwrap_err().to_string(),
            "You can only upload .png .jpg or .jpeg images"
        );
        assert_eq!(
            check_image("photo.jpeg", MAX_IMAGE_BYTES + 1).unwrap_err().to_string(),
            "Maximum allowed file size is 10485760 bytes."
        );
        assert_eq!(image_extension("a.b.JPEG"), Some(".jpeg"));
        assert_eq!(image_extension("noext"), None);
    }

    proptest! {
        #[test]
        fn length_check_agrees_with_char_count(s in "\\PC{0,60}") {
            let n = s.chars().count();
            let ok = check_length("Name", &s, 2, 50).is_ok();
            prop_assert_eq!(ok, (2..=50).contains(&n));
        }
    }
}
