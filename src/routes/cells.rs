/// Cell groups: recurring small-group meetings with leader-managed
/// membership.
///
/// Creation is admin-only. Membership changes are allowed for the group's
/// leader or an admin; this is the explicit role-plus-field policy. Upcoming
/// meeting dates are computed from the group's weekly meeting weekday.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Duration, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, RoleGate, Visibility, ROLE_ADMIN};
use crate::error::{AppError, DatabaseError, ValidationError};

const CELL_CREATE: RoleGate = RoleGate::new(&[]);

const DEFAULT_MEETING_COUNT: usize = 4;
const MAX_MEETING_COUNT: usize = 52;

#[derive(Deserialize)]
pub struct CreateCellRequest {
    pub name: String,
    pub leader_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub meeting_weekday: i16,
    pub location: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub person_id: Uuid,
}

#[derive(Deserialize)]
pub struct MeetingsQuery {
    pub count: Option<usize>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct CellResponse {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Uuid,
    pub meeting_weekday: i16,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct CellMemberResponse {
    pub person_id: Uuid,
    pub added_at: DateTime<Utc>,
}

fn weekday_from_index(index: i16) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next `count` weekly occurrences of `weekday`, starting at `from`
/// (inclusive when `from` falls on the meeting day).
fn upcoming_meeting_dates(weekday: Weekday, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let offset = (7 + weekday.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    let first = from + Duration::days(offset);

    (0..count)
        .map(|i| first + Duration::days(7 * i as i64))
        .collect()
}

async fn fetch_cell(pool: &PgPool, cell_id: Uuid) -> Result<CellResponse, AppError> {
    sqlx::query_as::<_, CellResponse>(
        "SELECT id, name, leader_id, meeting_weekday, location, created_at \
         FROM cell_groups WHERE id = $1",
    )
    .bind(cell_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Database(DatabaseError::NotFound("cell group".to_string())))
}

/// Membership management is restricted to the group's leader, with the usual
/// admin bypass.
fn ensure_cell_manager(claims: &Claims, leader_id: Uuid) -> Result<(), AppError> {
    if claims.role.as_deref() == Some(ROLE_ADMIN) {
        return Ok(());
    }
    if claims.user_id()? == leader_id {
        return Ok(());
    }
    Err(AppError::Auth(crate::error::AuthError::Forbidden))
}

/// POST /cells
pub async fn create_cell(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateCellRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    CELL_CREATE.authorize(&claims)?;

    if form.name.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "name".to_string(),
        )));
    }
    if weekday_from_index(form.meeting_weekday).is_none() {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "meeting_weekday".to_string(),
        )));
    }

    let leader = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE id = $1")
        .bind(form.leader_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if leader.is_none() {
        return Err(AppError::Database(DatabaseError::NotFound(
            "leader".to_string(),
        )));
    }

    let cell_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO cell_groups (id, name, leader_id, meeting_weekday, location, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(cell_id)
    .bind(form.name.trim())
    .bind(form.leader_id)
    .bind(form.meeting_weekday)
    .bind(&form.location)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(cell_id = %cell_id, leader_id = %form.leader_id, "Cell group created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Cell group created",
        "id": cell_id.to_string(),
    })))
}

/// GET /cells
///
/// Privileged roles see every group; everyone else sees the groups they
/// lead.
pub async fn list_cells(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let cells = match Visibility::for_claims(&claims)? {
        Visibility::Everything => {
            sqlx::query_as::<_, CellResponse>(
                "SELECT id, name, leader_id, meeting_weekday, location, created_at \
                 FROM cell_groups ORDER BY name",
            )
            .fetch_all(pool.get_ref())
            .await?
        }
        Visibility::AssignedTo(user_id) => {
            sqlx::query_as::<_, CellResponse>(
                "SELECT id, name, leader_id, meeting_weekday, location, created_at \
                 FROM cell_groups WHERE leader_id = $1 ORDER BY name",
            )
            .bind(user_id)
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(cells))
}

/// POST /cells/{id}/members
pub async fn add_member(
    claims: web::ReqData<Claims>,
    path: web::Path<Uuid>,
    form: web::Json<AddMemberRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let cell_id = path.into_inner();
    let cell = fetch_cell(pool.get_ref(), cell_id).await?;
    ensure_cell_manager(&claims, cell.leader_id)?;

    let person = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM people WHERE id = $1")
        .bind(form.person_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if person.is_none() {
        return Err(AppError::Validation(ValidationError::NotRegistered(
            form.person_id.to_string(),
        )));
    }

    let already = sqlx::query_as::<_, (Uuid,)>(
        "SELECT person_id FROM cell_members WHERE cell_id = $1 AND person_id = $2",
    )
    .bind(cell_id)
    .bind(form.person_id)
    .fetch_optional(pool.get_ref())
    .await?;
    if already.is_some() {
        return Err(AppError::Database(DatabaseError::Duplicate(
            "person is already a member of this cell".to_string(),
        )));
    }

    sqlx::query(
        "INSERT INTO cell_members (cell_id, person_id, added_by, added_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(cell_id)
    .bind(form.person_id)
    .bind(claims.user_id()?)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Member added",
    })))
}

/// DELETE /cells/{id}/members/{person_id}
pub async fn remove_member(
    claims: web::ReqData<Claims>,
    path: web::Path<(Uuid, Uuid)>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let (cell_id, person_id) = path.into_inner();
    let cell = fetch_cell(pool.get_ref(), cell_id).await?;
    ensure_cell_manager(&claims, cell.leader_id)?;

    let result =
        sqlx::query("DELETE FROM cell_members WHERE cell_id = $1 AND person_id = $2")
            .bind(cell_id)
            .bind(person_id)
            .execute(pool.get_ref())
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(
            "cell member".to_string(),
        )));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Member removed",
    })))
}

/// GET /cells/{id}/members
pub async fn list_members(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let cell_id = path.into_inner();
    fetch_cell(pool.get_ref(), cell_id).await?;

    let members = sqlx::query_as::<_, CellMemberResponse>(
        "SELECT person_id, added_at FROM cell_members WHERE cell_id = $1 ORDER BY added_at",
    )
    .bind(cell_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(members))
}

/// GET /cells/{id}/meetings?count=N
pub async fn upcoming_meetings(
    path: web::Path<Uuid>,
    query: web::Query<MeetingsQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let cell_id = path.into_inner();
    let cell = fetch_cell(pool.get_ref(), cell_id).await?;

    let weekday = weekday_from_index(cell.meeting_weekday).ok_or_else(|| {
        AppError::Internal(format!(
            "cell {} has invalid meeting weekday {}",
            cell.id, cell.meeting_weekday
        ))
    })?;

    let count = query
        .count
        .unwrap_or(DEFAULT_MEETING_COUNT)
        .min(MAX_MEETING_COUNT);

    let dates = upcoming_meeting_dates(weekday, Utc::now().date_naive(), count);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cell_id": cell.id.to_string(),
        "name": cell.name,
        "meetings": dates,
    })))
}
