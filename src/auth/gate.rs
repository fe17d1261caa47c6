/// Role-based authorization gate.
///
/// One `RoleGate` is declared per protected operation with its allow-list;
/// the admin bypass lives here and nowhere else. Handlers that only need
/// identity use `authenticate`.

use uuid::Uuid;

use crate::auth::claims::{Claims, ROLE_ADMIN, ROLE_REGISTRANT};
use crate::auth::jwt::decode_access_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    allowed: &'static [&'static str],
}

impl RoleGate {
    pub const fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }

    /// Decode a presented token and run the role check against it.
    pub fn check(&self, token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
        let claims = decode_access_token(token, config)?;
        self.authorize(&claims)?;
        Ok(claims)
    }

    /// Role check on already-decoded claims: `RoleMissing` when no role is
    /// present, admin passes any gate, everyone else must be on the
    /// allow-list.
    pub fn authorize(&self, claims: &Claims) -> Result<(), AppError> {
        let role = claims
            .role
            .as_deref()
            .ok_or(AppError::Auth(AuthError::RoleMissing))?;

        if role == ROLE_ADMIN {
            return Ok(());
        }

        if self.allowed.contains(&role) {
            Ok(())
        } else {
            Err(AppError::Auth(AuthError::Forbidden))
        }
    }
}

/// Authenticated-only check: identity without any role restriction.
pub fn authenticate(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    decode_access_token(token, config)
}

/// What a caller is allowed to see on list/read endpoints.
///
/// Privileged roles see everything; the `user` role (and any unrecognized
/// role, least privilege) sees only records assigned to it. Applied
/// uniformly — no endpoint decides this ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Everything,
    AssignedTo(Uuid),
}

impl Visibility {
    pub fn for_claims(claims: &Claims) -> Result<Self, AppError> {
        let role = claims
            .role
            .as_deref()
            .ok_or(AppError::Auth(AuthError::RoleMissing))?;

        if role == ROLE_ADMIN || role == ROLE_REGISTRANT {
            Ok(Visibility::Everything)
        } else {
            Ok(Visibility::AssignedTo(claims.user_id()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::ROLE_USER;

    fn claims_with_role(role: Option<&str>) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "test@example.com".to_string(),
            role.map(str::to_string),
            3600,
            "test".to_string(),
        )
    }

    #[test]
    fn admin_bypasses_any_allow_list() {
        let gate = RoleGate::new(&["editor"]);
        let claims = claims_with_role(Some(ROLE_ADMIN));

        assert!(gate.authorize(&claims).is_ok());
    }

    #[test]
    fn listed_role_passes() {
        let gate = RoleGate::new(&["editor"]);
        let claims = claims_with_role(Some("editor"));

        assert!(gate.authorize(&claims).is_ok());
    }

    #[test]
    fn unlisted_role_is_forbidden() {
        let gate = RoleGate::new(&["editor"]);
        let claims = claims_with_role(Some("viewer"));

        match gate.authorize(&claims) {
            Err(AppError::Auth(AuthError::Forbidden)) => (),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn missing_role_is_rejected() {
        let gate = RoleGate::new(&["editor"]);
        let claims = claims_with_role(None);

        match gate.authorize(&claims) {
            Err(AppError::Auth(AuthError::RoleMissing)) => (),
            other => panic!("expected RoleMissing, got {:?}", other),
        }
    }

    #[test]
    fn check_propagates_decode_failures() {
        let gate = RoleGate::new(&["editor"]);
        let config = JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        };

        match gate.check("garbage.token.here", &config) {
            Err(AppError::Auth(AuthError::TokenInvalid)) => (),
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn privileged_roles_see_everything() {
        for role in [ROLE_ADMIN, ROLE_REGISTRANT] {
            let claims = claims_with_role(Some(role));
            assert_eq!(
                Visibility::for_claims(&claims).unwrap(),
                Visibility::Everything
            );
        }
    }

    #[test]
    fn user_role_sees_only_assigned_records() {
        let claims = claims_with_role(Some(ROLE_USER));
        let scope = Visibility::for_claims(&claims).unwrap();

        assert_eq!(scope, Visibility::AssignedTo(claims.user_id().unwrap()));
    }

    #[test]
    fn unrecognized_role_defaults_to_least_privilege() {
        let claims = claims_with_role(Some("greeter"));
        let scope = Visibility::for_claims(&claims).unwrap();

        assert_eq!(scope, Visibility::AssignedTo(claims.user_id().unwrap()));
    }
}
