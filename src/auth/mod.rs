/// Authentication and authorization module.
///
/// Token generation/validation, credential hashing, refresh-token rotation,
/// the role gate, and the session operations built on top of them.

mod claims;
mod gate;
mod jwt;
mod password;
mod refresh_token;
pub mod session;
mod store;

pub use claims::{Claims, ROLE_ADMIN, ROLE_REGISTRANT, ROLE_USER};
pub use gate::{authenticate, RoleGate, Visibility};
pub use jwt::{decode_access_token, generate_access_token};
pub use password::{hash_password, validate_password_strength, verify_credential};
pub use refresh_token::{consume_and_rotate, issue, revoke, RefreshTokenPair};
pub use store::{NewUser, PgUserStore, StoredRefreshToken, UserRecord, UserStore};
