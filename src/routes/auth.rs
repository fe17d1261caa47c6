/// Session endpoints: signup, login, token refresh, logout, current user.

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditLog;
use crate::auth::session::{self, SignupData};
use crate::auth::{Claims, PgUserStore, UserStore};
use crate::configuration::JwtSettings;
use crate::error::{AppError, DatabaseError, ErrorContext};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub invited_by: Option<String>,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token_id: String,
    pub refresh_token: String,
}

/// Access token plus the refresh pair, returned at login and refresh.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token_id: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub role: String,
    pub created_at: String,
}

/// POST /auth/signup
///
/// Creates an account with default role `user` unless an explicit role is
/// supplied. Does not log the user in.
///
/// # Errors
/// - 400: invalid email/name or weak password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("signup");
    let store = PgUserStore::new(pool.get_ref().clone());
    let form = form.into_inner();

    let user_id = session::signup(
        &store,
        SignupData {
            name: form.name,
            surname: form.surname,
            date_of_birth: form.date_of_birth,
            home_address: form.home_address,
            phone_number: form.phone_number,
            gender: form.gender,
            invited_by: form.invited_by,
            email: form.email,
            password: form.password,
            role: form.role,
        },
    )
    .await
    .map_err(|e| {
        context.log_error(&e);
        AuditLog::new("SIGNUP", "user", "FAILURE", e.to_string()).record();
        e
    })?;

    AuditLog::new("SIGNUP", "user", "SUCCESS", "Account created")
        .with_resource_id(user_id.to_string())
        .record();

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User signed up"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Account created",
        "user_id": user_id.to_string(),
    })))
}

/// POST /auth/login
///
/// Verifies credentials and returns one access token plus a refresh pair.
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");
    let store = PgUserStore::new(pool.get_ref().clone());

    let tokens = session::login(&store, &form.email, &form.password, jwt_config.get_ref())
        .await
        .map_err(|e| {
            context.log_error(&e);
            AuditLog::new("LOGIN", "user", "FAILURE", e.to_string()).record();
            e
        })?;

    AuditLog::new("LOGIN", "user", "SUCCESS", "User logged in").record();

    tracing::info!(request_id = %context.request_id, "User logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: tokens.access_token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expires_in,
        refresh_token_id: tokens.refresh_token_id,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /auth/refresh
///
/// Exchanges a refresh pair for a new access token and a rotated pair. A
/// rotated or revoked pair always fails with 401; concurrent refreshes for
/// the same user race, and the loser must not retry with its stale secret.
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("refresh");
    let store = PgUserStore::new(pool.get_ref().clone());

    let tokens = session::refresh(
        &store,
        &form.refresh_token_id,
        &form.refresh_token,
        jwt_config.get_ref(),
    )
    .await
    .map_err(|e| {
        context.log_error(&e);
        AuditLog::new("REFRESH", "user", "FAILURE", e.to_string()).record();
        e
    })?;

    AuditLog::new("REFRESH", "user", "SUCCESS", "Tokens rotated").record();

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: tokens.access_token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expires_in,
        refresh_token_id: tokens.refresh_token_id,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /auth/logout
///
/// Requires a valid access token. Revokes the stored refresh pair; the live
/// access token is not blacklisted and expires on its own schedule.
pub async fn logout(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let store = PgUserStore::new(pool.get_ref().clone());
    let user_id = claims.user_id()?;

    session::logout(&store, user_id).await?;

    AuditLog::new("LOGOUT", "user", "SUCCESS", "Refresh token revoked")
        .with_user_id(user_id.to_string())
        .record();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out",
    })))
}

/// GET /auth/me
///
/// Returns the authenticated caller's profile.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let store = PgUserStore::new(pool.get_ref().clone());
    let user_id = claims.user_id()?;

    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound("user".to_string())))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
        surname: user.surname,
        role: user.role,
        created_at: user.created_at.to_rfc3339(),
    }))
}
