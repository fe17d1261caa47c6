/// User registry collaborator.
///
/// The session core talks to user records through `UserStore`, so the
/// token-rotation logic is testable against an in-memory store while the
/// server runs on `PgUserStore`. Email uniqueness is enforced by the unique
/// index on `users.email`; `insert` surfaces the violation as `EmailTaken`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// A persisted user row. Carries at most one active refresh-token triple;
/// issuing a new one overwrites the prior one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub invited_by: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub refresh_token_id: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub refresh_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user. Refresh-token fields start absent.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub date_of_birth: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub invited_by: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// The (id, hash, expiry) triple stored on the user row.
#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub token_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError>;
    async fn find_by_refresh_token_id(
        &self,
        token_id: &str,
    ) -> Result<Option<UserRecord>, AppError>;
    async fn insert(&self, user: NewUser) -> Result<(), AppError>;
    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: &StoredRefreshToken,
    ) -> Result<(), AppError>;
    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError>;
}

const USER_COLUMNS: &str = "id, name, surname, date_of_birth, home_address, phone_number, \
     gender, invited_by, email, password_hash, role, refresh_token_id, refresh_token_hash, \
     refresh_token_expires, created_at";

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_refresh_token_id(
        &self,
        token_id: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE refresh_token_id = $1",
            USER_COLUMNS
        ))
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users
            (id, name, surname, date_of_birth, home_address, phone_number, gender,
             invited_by, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(user.date_of_birth)
        .bind(&user.home_address)
        .bind(&user.phone_number)
        .bind(&user.gender)
        .bind(&user.invited_by)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_refresh_token(
        &self,
        user_id: Uuid,
        token: &StoredRefreshToken,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_id = $1, refresh_token_hash = $2, refresh_token_expires = $3
            WHERE id = $4
            "#,
        )
        .bind(&token.token_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_id = NULL, refresh_token_hash = NULL, refresh_token_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
