/// Events and attendance: create/list/read events, check people in and out.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::auth::{Claims, RoleGate, ROLE_REGISTRANT};
use crate::error::{AppError, DatabaseError, ValidationError};
use crate::validators::is_valid_name;

const EVENT_WRITE: RoleGate = RoleGate::new(&[ROLE_REGISTRANT]);
const CHECKIN: RoleGate = RoleGate::new(&[ROLE_REGISTRANT]);

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub event_type: String,
    pub service_name: String,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    /// Comma-separated list of event types
    pub event_type: Option<String>,
    /// Substring match over service name and location
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct AttendeeRequest {
    pub person_name: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct EventResponse {
    pub id: Uuid,
    pub event_type: String,
    pub service_name: String,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub total_attendance: i64,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct AttendeeResponse {
    pub person_id: Uuid,
    pub person_name: String,
    pub checked_in_at: DateTime<Utc>,
}

const EVENT_COLUMNS: &str = "e.id, e.event_type, e.service_name, e.event_date, e.location, \
     (SELECT COUNT(*) FROM attendance a WHERE a.event_id = e.id) AS total_attendance";

/// POST /events
pub async fn create_event(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateEventRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    EVENT_WRITE.authorize(&claims)?;

    if form.service_name.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "service_name".to_string(),
        )));
    }
    if form.event_type.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "event_type".to_string(),
        )));
    }

    let event_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO events (id, event_type, service_name, event_date, location, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(event_id)
    .bind(form.event_type.trim())
    .bind(form.service_name.trim())
    .bind(form.event_date)
    .bind(&form.location)
    .bind(claims.user_id()?)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(event_id = %event_id, "Event created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Event created",
        "id": event_id.to_string(),
    })))
}

/// GET /events?event_type=...&search=...
pub async fn list_events(
    query: web::Query<EventsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    // Normalize the comma-separated type filter before it hits the query.
    let types = query.event_type.as_deref().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    });

    let events = sqlx::query_as::<_, EventResponse>(&format!(
        r#"
        SELECT {} FROM events e
        WHERE ($1::text IS NULL OR e.event_type = ANY(string_to_array($1, ',')))
          AND ($2::text IS NULL
               OR e.service_name ILIKE '%' || $2 || '%'
               OR e.location ILIKE '%' || $2 || '%')
        ORDER BY e.event_date DESC
        "#,
        EVENT_COLUMNS
    ))
    .bind(types)
    .bind(&query.search)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(events))
}

/// GET /events/{id}
pub async fn get_event(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();

    let event = sqlx::query_as::<_, EventResponse>(&format!(
        "SELECT {} FROM events e WHERE e.id = $1",
        EVENT_COLUMNS
    ))
    .bind(event_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("event".to_string())))?;

    Ok(HttpResponse::Ok().json(event))
}

/// Case-insensitive exact lookup in the people registry.
async fn find_person_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<(Uuid, String)>, AppError> {
    let person = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM people WHERE LOWER(name) = LOWER($1)",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(person)
}

/// POST /events/{id}/checkin
///
/// The event must exist (404), the person must be in the registry (400) and
/// must not already be checked in (409).
pub async fn check_in(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    form: web::Json<AttendeeRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    CHECKIN.authorize(&claims)?;

    let event_id = path.into_inner();
    let person_name = is_valid_name(&form.person_name)?;

    let event_exists = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if event_exists.is_none() {
        return Err(AppError::Database(DatabaseError::NotFound(
            "event".to_string(),
        )));
    }

    let (person_id, registered_name) = find_person_by_name(pool.get_ref(), &person_name)
        .await?
        .ok_or_else(|| {
            AppError::Validation(ValidationError::NotRegistered(person_name.clone()))
        })?;

    let already = sqlx::query_as::<_, (Uuid,)>(
        "SELECT id FROM attendance WHERE event_id = $1 AND person_id = $2",
    )
    .bind(event_id)
    .bind(person_id)
    .fetch_optional(pool.get_ref())
    .await?;
    if already.is_some() {
        return Err(AppError::Database(DatabaseError::Duplicate(format!(
            "{} is already checked in",
            registered_name
        ))));
    }

    sqlx::query(
        r#"
        INSERT INTO attendance (id, event_id, person_id, person_name, checked_in_at, checked_in_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(person_id)
    .bind(&registered_name)
    .bind(Utc::now())
    .bind(claims.user_id()?)
    .execute(pool.get_ref())
    .await?;

    AuditLog::new("CHECKIN", "event", "SUCCESS", format!("{} checked in", registered_name))
        .with_resource_id(event_id.to_string())
        .with_user_id(claims.sub.clone())
        .record();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("{} checked in successfully", registered_name),
    })))
}

/// POST /events/{id}/checkout
///
/// Removes a person's check-in ("uncapture"); 404 when they were not checked
/// in.
pub async fn check_out(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    form: web::Json<AttendeeRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    CHECKIN.authorize(&claims)?;

    let event_id = path.into_inner();
    let person_name = is_valid_name(&form.person_name)?;

    let result = sqlx::query(
        "DELETE FROM attendance WHERE event_id = $1 AND LOWER(person_name) = LOWER($2)",
    )
    .bind(event_id)
    .bind(&person_name)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "check-in".to_string(),
        )));
    }

    AuditLog::new("CHECKOUT", "event", "SUCCESS", format!("{} removed", person_name))
        .with_resource_id(event_id.to_string())
        .with_user_id(claims.sub.clone())
        .record();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("{} removed from check-ins", person_name),
    })))
}

/// GET /events/{id}/attendance
pub async fn list_attendance(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();

    let service_name =
        sqlx::query_as::<_, (String,)>("SELECT service_name FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| AppError::Database(DatabaseError::NotFound("event".to_string())))?
            .0;

    let attendees = sqlx::query_as::<_, AttendeeResponse>(
        r#"
        SELECT person_id, person_name, checked_in_at
        FROM attendance WHERE event_id = $1
        ORDER BY checked_in_at
        "#,
    )
    .bind(event_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "event_id": event_id.to_string(),
        "service_name": service_name,
        "total_attendance": attendees.len(),
        "attendees": attendees,
    })))
}
