/// Refresh token issuance, rotation and revocation.
///
/// Each user carries at most one active (id, hash, expiry) triple on their
/// record. The id is a plain lookup key; the secret leaves the server exactly
/// once and is stored only as a bcrypt hash. Every successful refresh rotates
/// the pair, so reuse of a rotated or revoked pair always fails — a leaked
/// refresh token is good for at most one exchange.

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use uuid::Uuid;

use crate::auth::password::{hash_credential, verify_credential};
use crate::auth::store::{StoredRefreshToken, UserRecord, UserStore};
use crate::error::{AppError, AuthError};

const SECRET_LENGTH: usize = 64;

/// The pair handed to the client: a public lookup id and a one-time-visible
/// secret.
#[derive(Debug, Clone)]
pub struct RefreshTokenPair {
    pub token_id: String,
    pub secret: String,
}

/// Generate a fresh high-entropy refresh-token secret.
pub fn generate_refresh_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// Issue a fresh pair for a user, overwriting any prior triple.
pub async fn issue<S: UserStore>(
    store: &S,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<RefreshTokenPair, AppError> {
    let pair = RefreshTokenPair {
        token_id: Uuid::new_v4().to_string(),
        secret: generate_refresh_secret(),
    };

    let stored = StoredRefreshToken {
        token_id: pair.token_id.clone(),
        token_hash: hash_credential(&pair.secret)?,
        expires_at: Utc::now() + Duration::seconds(ttl_seconds),
    };

    store.set_refresh_token(user_id, &stored).await?;

    Ok(pair)
}

/// Exchange a presented pair for a fresh one (rotation).
///
/// Fails with `RefreshInvalid` when no user carries the id, the stored hash
/// does not verify against the presented secret, or the stored expiry has
/// passed. On success the stored triple is replaced before the new pair is
/// returned, so the presented pair can never be used again.
pub async fn consume_and_rotate<S: UserStore>(
    store: &S,
    token_id: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<(UserRecord, RefreshTokenPair), AppError> {
    let user = store
        .find_by_refresh_token_id(token_id)
        .await?
        .ok_or(AppError::Auth(AuthError::RefreshInvalid))?;

    let stored_hash = user
        .refresh_token_hash
        .as_deref()
        .ok_or(AppError::Auth(AuthError::RefreshInvalid))?;

    if !verify_credential(secret, stored_hash) {
        tracing::warn!(user_id = %user.id, "Refresh token secret mismatch");
        return Err(AppError::Auth(AuthError::RefreshInvalid));
    }

    match user.refresh_token_expires {
        Some(expires_at) if expires_at > Utc::now() => {}
        _ => {
            tracing::info!(user_id = %user.id, "Refresh token expired");
            return Err(AppError::Auth(AuthError::RefreshInvalid));
        }
    }

    let new_pair = issue(store, user.id, ttl_seconds).await?;

    Ok((user, new_pair))
}

/// Clear the stored triple unconditionally.
pub async fn revoke<S: UserStore>(store: &S, user_id: Uuid) -> Result<(), AppError> {
    store.clear_refresh_token(user_id).await?;
    tracing::info!(user_id = %user_id, "Refresh token revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_long_and_distinct() {
        let a = generate_refresh_secret();
        let b = generate_refresh_secret();

        assert_eq!(a.len(), SECRET_LENGTH);
        assert!(a.chars().all(|c| c.is_alphanumeric()));
        assert_ne!(a, b);
    }
}
