/// People registry: create, list, regex search, read, update.
///
/// Writes and searches are registrant-gated; list/read apply the uniform
/// visibility scope, so `user`-role callers only see people assigned to them.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, RoleGate, Visibility, ROLE_REGISTRANT};
use crate::error::{AppError, DatabaseError};
use crate::validators::{is_valid_email, is_valid_name, is_valid_search_pattern};

const PEOPLE_WRITE: RoleGate = RoleGate::new(&[ROLE_REGISTRANT]);
const PEOPLE_SEARCH: RoleGate = RoleGate::new(&[ROLE_REGISTRANT]);

#[derive(Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub home_address: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub invited_by: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdatePersonRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub home_address: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub invited_by: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub pattern: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct PersonResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub home_address: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub invited_by: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

const PERSON_COLUMNS: &str = "id, name, surname, email, phone_number, home_address, gender, \
     date_of_birth, invited_by, assigned_to, created_at";

/// POST /people
pub async fn create_person(
    claims: web::ReqData<Claims>,
    form: web::Json<CreatePersonRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    PEOPLE_WRITE.authorize(&claims)?;

    let name = is_valid_name(&form.name)?;
    let email = match form.email.as_deref() {
        Some(e) => Some(is_valid_email(e)?),
        None => None,
    };

    let person_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO people
        (id, name, surname, email, phone_number, home_address, gender, date_of_birth,
         invited_by, assigned_to, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(person_id)
    .bind(&name)
    .bind(&form.surname)
    .bind(&email)
    .bind(&form.phone_number)
    .bind(&form.home_address)
    .bind(&form.gender)
    .bind(form.date_of_birth)
    .bind(&form.invited_by)
    .bind(form.assigned_to)
    .bind(claims.user_id()?)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(person_id = %person_id, "Person added to registry");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Person created",
        "id": person_id.to_string(),
    })))
}

/// GET /people
pub async fn list_people(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let people = match Visibility::for_claims(&claims)? {
        Visibility::Everything => {
            sqlx::query_as::<_, PersonResponse>(&format!(
                "SELECT {} FROM people ORDER BY name",
                PERSON_COLUMNS
            ))
            .fetch_all(pool.get_ref())
            .await?
        }
        Visibility::AssignedTo(user_id) => {
            sqlx::query_as::<_, PersonResponse>(&format!(
                "SELECT {} FROM people WHERE assigned_to = $1 ORDER BY name",
                PERSON_COLUMNS
            ))
            .bind(user_id)
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(people))
}

/// GET /people/search?pattern=...
///
/// Case-insensitive regular-expression match over names. The pattern is
/// validated (bounded, must compile) before it reaches the database.
pub async fn search_people(
    claims: web::ReqData<Claims>,
    query: web::Query<SearchQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    PEOPLE_SEARCH.authorize(&claims)?;

    let pattern = is_valid_search_pattern(&query.pattern)?;

    let people = sqlx::query_as::<_, PersonResponse>(&format!(
        "SELECT {} FROM people WHERE name ~* $1 ORDER BY name",
        PERSON_COLUMNS
    ))
    .bind(&pattern)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "results": people })))
}

/// GET /people/{id}
///
/// A `user`-role caller gets 404 for people outside their assignment, so the
/// endpoint does not leak which ids exist.
pub async fn get_person(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let person_id = path.into_inner();

    let person = sqlx::query_as::<_, PersonResponse>(&format!(
        "SELECT {} FROM people WHERE id = $1",
        PERSON_COLUMNS
    ))
    .bind(person_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("person".to_string())))?;

    if let Visibility::AssignedTo(user_id) = Visibility::for_claims(&claims)? {
        if person.assigned_to != Some(user_id) {
            return Err(AppError::Database(DatabaseError::NotFound(
                "person".to_string(),
            )));
        }
    }

    Ok(HttpResponse::Ok().json(person))
}

/// PUT /people/{id}
pub async fn update_person(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    form: web::Json<UpdatePersonRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    PEOPLE_WRITE.authorize(&claims)?;

    let person_id = path.into_inner();

    let name = match form.name.as_deref() {
        Some(n) => Some(is_valid_name(n)?),
        None => None,
    };
    let email = match form.email.as_deref() {
        Some(e) => Some(is_valid_email(e)?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        UPDATE people SET
            name = COALESCE($1, name),
            surname = COALESCE($2, surname),
            email = COALESCE($3, email),
            phone_number = COALESCE($4, phone_number),
            home_address = COALESCE($5, home_address),
            gender = COALESCE($6, gender),
            date_of_birth = COALESCE($7, date_of_birth),
            invited_by = COALESCE($8, invited_by),
            assigned_to = COALESCE($9, assigned_to)
        WHERE id = $10
        "#,
    )
    .bind(&name)
    .bind(&form.surname)
    .bind(&email)
    .bind(&form.phone_number)
    .bind(&form.home_address)
    .bind(&form.gender)
    .bind(form.date_of_birth)
    .bind(&form.invited_by)
    .bind(form.assigned_to)
    .bind(person_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "person".to_string(),
        )));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Person updated",
        "id": person_id.to_string(),
    })))
}
