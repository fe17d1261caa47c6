/// Access token codec.
///
/// Encodes and decodes the signed claim set. The signing key and algorithm
/// are process-wide configuration; expiry is verified with zero leeway on
/// every decode.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

fn algorithm(config: &JwtSettings) -> Result<Algorithm, AppError> {
    config
        .algorithm
        .parse::<Algorithm>()
        .map_err(|_| AppError::Internal(format!("unknown JWT algorithm: {}", config.algorithm)))
}

/// Generate a new access token for a user.
pub fn generate_access_token(
    user_id: &Uuid,
    email: &str,
    role: Option<&str>,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        *user_id,
        email.to_string(),
        role.map(str::to_string),
        config.access_token_expiry,
        config.issuer.clone(),
    );

    encode(
        &Header::new(algorithm(config)?),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token generation failed: {}", e)))
}

/// Verify signature, issuer and expiry, and extract the claims.
///
/// Fails with `TokenExpired` when the expiry has passed and `TokenInvalid`
/// on any signature or format failure. Claim-shape policy beyond the typed
/// record (e.g. role checks) is the caller's job.
pub fn decode_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(algorithm(config)?);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Auth(AuthError::TokenExpired)
        }
        _ => {
            tracing::warn!("JWT validation error: {}", e);
            AppError::Auth(AuthError::TokenInvalid)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::ROLE_REGISTRANT;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    fn expect_auth_error(result: Result<Claims, AppError>) -> AuthError {
        match result {
            Err(AppError::Auth(e)) => e,
            other => panic!("expected auth error, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn generate_and_decode_token() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token =
            generate_access_token(&user_id, "test@example.com", Some(ROLE_REGISTRANT), &config)
                .expect("Failed to generate token");
        let claims = decode_access_token(&token, &config).expect("Failed to decode token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role.as_deref(), Some(ROLE_REGISTRANT));
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn garbage_token_is_invalid() {
        let config = get_test_config();
        let result = decode_access_token("invalid.token.here", &config);

        assert_eq!(expect_auth_error(result), AuthError::TokenInvalid);
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&user_id, "test@example.com", None, &config)
            .expect("Failed to generate token");

        let tampered = format!("{}X", token);
        let result = decode_access_token(&tampered, &config);

        assert_eq!(expect_auth_error(result), AuthError::TokenInvalid);
    }

    #[test]
    fn expired_token_is_distinguished() {
        let mut config = get_test_config();
        // Issue a token that was already expired at creation time.
        config.access_token_expiry = -3600;
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&user_id, "test@example.com", None, &config)
            .expect("Failed to generate token");

        config.access_token_expiry = 3600;
        let result = decode_access_token(&token, &config);

        assert_eq!(expect_auth_error(result), AuthError::TokenExpired);
    }

    #[test]
    fn wrong_issuer_is_invalid() {
        let mut config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&user_id, "test@example.com", None, &config)
            .expect("Failed to generate token");

        config.issuer = "wrong-issuer".to_string();
        let result = decode_access_token(&token, &config);

        assert_eq!(expect_auth_error(result), AuthError::TokenInvalid);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&user_id, "test@example.com", None, &config)
            .expect("Failed to generate token");

        let mut other = get_test_config();
        other.secret = "another-secret-key-also-32-characters!!".to_string();
        let result = decode_access_token(&token, &other);

        assert_eq!(expect_auth_error(result), AuthError::TokenInvalid);
    }
}
