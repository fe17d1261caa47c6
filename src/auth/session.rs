/// Session operations: signup, login, refresh, logout.
///
/// These orchestrate the credential hasher, token codec and refresh-token
/// store against the user registry. They are generic over `UserStore` so the
/// whole flow runs against an in-memory registry in tests.

use uuid::Uuid;

use crate::auth::claims::ROLE_USER;
use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_credential};
use crate::auth::refresh_token;
use crate::auth::store::{NewUser, UserStore};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::validators::{is_valid_email, is_valid_name};

/// Profile fields accepted at signup.
#[derive(Debug, Clone)]
pub struct SignupData {
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub home_address: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub invited_by: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Tokens handed out at login and refresh.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token_id: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Create a new account. Does not log the user in.
pub async fn signup<S: UserStore>(store: &S, data: SignupData) -> Result<Uuid, AppError> {
    let email = is_valid_email(&data.email)?;
    let name = is_valid_name(&data.name)?;
    let surname = is_valid_name(&data.surname)?;
    let password_hash = hash_password(&data.password)?;

    if store.find_by_email(&email).await?.is_some() {
        return Err(AppError::Database(DatabaseError::EmailTaken));
    }

    let user_id = Uuid::new_v4();
    store
        .insert(NewUser {
            id: user_id,
            name,
            surname,
            date_of_birth: data.date_of_birth,
            home_address: data.home_address,
            phone_number: data.phone_number,
            gender: data.gender,
            invited_by: data.invited_by,
            email,
            password_hash,
            role: data.role.unwrap_or_else(|| ROLE_USER.to_string()),
        })
        .await?;

    Ok(user_id)
}

/// Verify credentials and issue one access token plus a refresh pair.
///
/// Unknown email and wrong password fail identically so callers cannot probe
/// which addresses are registered.
pub async fn login<S: UserStore>(
    store: &S,
    email: &str,
    password: &str,
    config: &JwtSettings,
) -> Result<SessionTokens, AppError> {
    let email = is_valid_email(email)?;

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !verify_credential(password, &user.password_hash) {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token =
        generate_access_token(&user.id, &user.email, Some(user.role.as_str()), config)?;
    let pair = refresh_token::issue(store, user.id, config.refresh_token_expiry).await?;

    Ok(SessionTokens {
        access_token,
        refresh_token_id: pair.token_id,
        refresh_token: pair.secret,
        expires_in: config.access_token_expiry,
    })
}

/// Exchange a refresh pair for a fresh access token and a rotated pair.
pub async fn refresh<S: UserStore>(
    store: &S,
    token_id: &str,
    secret: &str,
    config: &JwtSettings,
) -> Result<SessionTokens, AppError> {
    let (user, pair) =
        refresh_token::consume_and_rotate(store, token_id, secret, config.refresh_token_expiry)
            .await?;

    let access_token =
        generate_access_token(&user.id, &user.email, Some(user.role.as_str()), config)?;

    Ok(SessionTokens {
        access_token,
        refresh_token_id: pair.token_id,
        refresh_token: pair.secret,
        expires_in: config.access_token_expiry,
    })
}

/// Revoke the caller's stored refresh triple. The live access token is not
/// blacklisted; it expires on its own schedule.
pub async fn logout<S: UserStore>(store: &S, user_id: Uuid) -> Result<(), AppError> {
    refresh_token::revoke(store, user_id).await
}
