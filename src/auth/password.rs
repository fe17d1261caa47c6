/// Credential hashing and verification.
///
/// One bcrypt-backed hasher for both user passwords and refresh-token
/// secrets. Verification never surfaces an error to the caller: a malformed
/// hash simply fails to verify.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash an arbitrary secret (password or refresh-token secret) with bcrypt.
/// The output is salted, so two calls on the same input differ.
pub fn hash_credential(plaintext: &str) -> Result<String, AppError> {
    hash(plaintext, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("credential hashing failed: {}", e)))
}

/// Verify a secret against its stored hash.
/// Malformed hash input verifies false rather than erroring.
pub fn verify_credential(plaintext: &str, hashed: &str) -> bool {
    verify(plaintext, hashed).unwrap_or(false)
}

/// Hash a new user password, enforcing the strength rule first.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;
    hash_credential(password)
}

/// Password strength rule: 8..=128 characters, at least one letter and one
/// digit.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::WeakPassword(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))));
    }

    // bcrypt limitation and DoS prevention
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::WeakPassword(format!(
            "must be at most {} characters",
            MAX_PASSWORD_LENGTH
        ))));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_letter || !has_digit {
        return Err(AppError::Validation(ValidationError::WeakPassword(
            "must contain at least one letter and one digit".to_string(),
        )));
    }

    Ok(())
}
