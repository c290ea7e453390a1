//! Small field validators shared by the request payloads.
//! Each helper records its message into a `FieldErrors` under the given path.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::FieldErrors;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

pub const BLANK: &str = "This field may not be blank.";
pub const REQUIRED: &str = "This field is required.";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Trims `value`, then checks it is non-empty and at most `max` characters.
/// Returns the trimmed value for storage.
pub fn required_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
    } else if trimmed.chars().count() > max {
        errors.add(field, too_long(max));
    }
    trimmed.to_string()
}

/// Like `required_text`, but blank is allowed.
pub fn optional_text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        errors.add(field, too_long(max));
    }
    trimmed.to_string()
}

pub fn email(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, BLANK);
    } else if !is_valid_email(trimmed) {
        errors.add(field, "Enter a valid email address.");
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("john.doe+cv@example.co.uk"));
        assert!(!is_valid_email("john.doe@"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn test_required_text_trims_and_flags_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_text(&mut errors, "title", "  My CV  ", 200), "My CV");
        assert!(errors.is_empty());

        required_text(&mut errors, "title", "   ", 200);
        assert_eq!(errors.get("title").unwrap(), [BLANK.to_string()]);
    }

    #[test]
    fn test_length_limits_count_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        required_text(&mut errors, "name", &"é".repeat(100), 100);
        assert!(errors.is_empty());

        optional_text(&mut errors, "phone", &"1".repeat(21), 20);
        assert_eq!(errors.get("phone").unwrap(), [too_long(20)]);
    }
}
