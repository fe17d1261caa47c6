/// Follow-up tasks: calling/visiting reminders with date-window queries.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{Claims, RoleGate, ROLE_REGISTRANT};
use crate::error::{AppError, ValidationError};
use crate::validators::is_valid_name;

const TASK_WRITE: RoleGate = RoleGate::new(&[ROLE_REGISTRANT]);

const OPEN_STATUSES: &[&str] = &["Pending", "Calling", "Visiting"];

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub person_id: Option<Uuid>,
    pub person_name: String,
    pub contacted_name: Option<String>,
    pub contacted_phone: Option<String>,
    pub followup_date: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct TaskResponse {
    pub id: Uuid,
    pub person_id: Option<Uuid>,
    pub person_name: String,
    pub contacted_name: Option<String>,
    pub contacted_phone: Option<String>,
    pub followup_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, person_id, person_name, contacted_name, contacted_phone, \
     followup_date, status, created_at";

/// [midnight, next midnight) for a calendar day, in UTC.
fn day_window(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    (start, start + Duration::days(1))
}

/// [now - days, now)
fn trailing_days_window(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(days), now)
}

/// [Monday midnight, now)
fn week_so_far_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (monday.and_hms_opt(0, 0, 0).unwrap().and_utc(), now)
}

/// [first day of previous month, first day of current month)
fn previous_month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let first_this = today.with_day(1).unwrap();
    let first_prev = if first_this.month() == 1 {
        NaiveDate::from_ymd_opt(first_this.year() - 1, 12, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(first_this.year(), first_this.month() - 1, 1).unwrap()
    };

    (
        first_prev.and_hms_opt(0, 0, 0).unwrap().and_utc(),
        first_this.and_hms_opt(0, 0, 0).unwrap().and_utc(),
    )
}

async fn fetch_tasks_between(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TaskResponse>, AppError> {
    let tasks = sqlx::query_as::<_, TaskResponse>(&format!(
        "SELECT {} FROM followup_tasks \
         WHERE followup_date >= $1 AND followup_date < $2 \
         ORDER BY followup_date",
        TASK_COLUMNS
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}

/// POST /tasks
pub async fn create_task(
    claims: web::ReqData<Claims>,
    form: web::Json<CreateTaskRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    TASK_WRITE.authorize(&claims)?;

    let person_name = is_valid_name(&form.person_name)?;
    let status = form.status.clone().unwrap_or_else(|| "Pending".to_string());

    let task_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO followup_tasks
        (id, person_id, person_name, contacted_name, contacted_phone, followup_date,
         status, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(task_id)
    .bind(form.person_id)
    .bind(&person_name)
    .bind(&form.contacted_name)
    .bind(&form.contacted_phone)
    .bind(form.followup_date)
    .bind(&status)
    .bind(claims.user_id()?)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Task created",
        "id": task_id.to_string(),
    })))
}

/// GET /tasks — open follow-ups only.
pub async fn list_open_tasks(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let open_statuses: Vec<String> = OPEN_STATUSES.iter().map(|s| s.to_string()).collect();
    let tasks = sqlx::query_as::<_, TaskResponse>(&format!(
        "SELECT {} FROM followup_tasks WHERE status = ANY($1) ORDER BY followup_date",
        TASK_COLUMNS
    ))
    .bind(open_statuses)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/day/{date} with date in YYYY-MM-DD.
pub async fn tasks_by_day(
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let date = NaiveDate::parse_from_str(&path.into_inner(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(ValidationError::InvalidFormat(
            "date (expected YYYY-MM-DD)".to_string(),
        ))
    })?;

    let (start, end) = day_window(date);
    let tasks = fetch_tasks_between(pool.get_ref(), start, end).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/last-7-days
pub async fn tasks_last_7_days(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let (start, end) = trailing_days_window(Utc::now(), 7);
    let tasks = fetch_tasks_between(pool.get_ref(), start, end).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/this-week
pub async fn tasks_this_week(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let (start, end) = week_so_far_window(Utc::now());
    let tasks = fetch_tasks_between(pool.get_ref(), start, end).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/previous-month
pub async fn tasks_previous_month(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let (start, end) = previous_month_window(Utc::now());
    let tasks = fetch_tasks_between(pool.get_ref(), start, end).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_window_covers_exactly_one_day() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let (start, end) = day_window(day);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 5, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap());
    }

    #[test]
    fn trailing_days_window_ends_now() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 15, 30, 0).unwrap();
        let (start, end) = trailing_days_window(now, 7);

        assert_eq!(end, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 7, 29, 15, 30, 0).unwrap());
    }

    #[test]
    fn week_starts_on_monday_midnight() {
        // 2026-08-05 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 15, 30, 0).unwrap();
        let (start, end) = week_so_far_window(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 3, 0, 0, 0).unwrap());
        assert_eq!(end, now);
    }

    #[test]
    fn week_window_on_a_monday_starts_that_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap();
        let (start, _) = week_so_far_window(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn previous_month_window_is_the_full_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 15, 30, 0).unwrap();
        let (start, end) = previous_month_window(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn previous_month_wraps_across_year_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let (start, end) = previous_month_window(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
