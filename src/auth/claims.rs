/// JWT claim set for access tokens.
///
/// A typed record with required fields (RFC 7519 registered claims plus the
/// account's email and role), validated by serde at decode time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// Distinguished role that bypasses every allow-list.
pub const ROLE_ADMIN: &str = "admin";
/// Role allowed to manage people, events and check-ins.
pub const ROLE_REGISTRANT: &str = "registrant";
/// Default role assigned at signup; sees only records assigned to it.
pub const ROLE_USER: &str = "user";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Role name; tokens minted by this service always carry one, but the
    /// field stays optional so the gate can reject role-less tokens itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        email: String,
        role: Option<String>,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            role,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract the user ID from the subject claim.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            "test@example.com".to_string(),
            Some(ROLE_USER.to_string()),
            3600,
            "test".to_string(),
        );

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role.as_deref(), Some(ROLE_USER));
        assert_eq!(claims.iss, "test");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            "test@example.com".to_string(),
            None,
            3600,
            "test".to_string(),
        );

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn invalid_user_id() {
        let mut claims = Claims::new(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            None,
            3600,
            "test".to_string(),
        );
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_err());
    }

    #[test]
    fn role_is_omitted_from_json_when_absent() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            None,
            3600,
            "test".to_string(),
        );
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("role"));
    }
}
