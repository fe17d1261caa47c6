/// Input validators for inbound payloads and query parameters.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MAX_SEARCH_PATTERN_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address: length bounds plus format.
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

    if !EMAIL_REGEX.is_match(trimmed) || trimmed.matches('@').count() != 1 {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a person or user name: non-empty, bounded, no control characters.
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(
            "name".to_string(),
            MAX_NAME_LENGTH,
        ));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("name".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a caller-supplied search pattern before it reaches the database
/// regex operator: bounded length and must compile as a regular expression.
pub fn is_valid_search_pattern(pattern: &str) -> Result<String, ValidationError> {
    let trimmed = pattern.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("pattern".to_string()));
    }

    if trimmed.len() > MAX_SEARCH_PATTERN_LENGTH {
        return Err(ValidationError::TooLong(
            "pattern".to_string(),
            MAX_SEARCH_PATTERN_LENGTH,
        ));
    }

    if Regex::new(trimmed).is_err() {
        return Err(ValidationError::InvalidFormat("pattern".to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@a.com").is_err()); // Too short
    }

    #[test]
    fn email_is_trimmed() {
        assert_eq!(
            is_valid_email("  user@example.com  ").unwrap(),
            "user@example.com"
        );
    }

    #[test]
    fn valid_name() {
        assert!(is_valid_name("John Doe").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn name_length_limits() {
        let too_long = "a".repeat(257);
        assert!(is_valid_name(&too_long).is_err());

        assert!(is_valid_name("").is_err());
    }

    #[test]
    fn control_characters_rejected_in_name() {
        assert!(is_valid_name("Name\0with\0null").is_err());
        assert!(is_valid_name("Name\twith\ttabs").is_err());
    }

    #[test]
    fn valid_search_pattern() {
        assert!(is_valid_search_pattern("smith").is_ok());
        assert!(is_valid_search_pattern("^Jo.*").is_ok());
    }

    #[test]
    fn broken_search_pattern_rejected() {
        assert!(is_valid_search_pattern("(unclosed").is_err());
        assert!(is_valid_search_pattern("").is_err());
        assert!(is_valid_search_pattern(&"a".repeat(200)).is_err());
    }
}
