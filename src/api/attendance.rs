use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{is_unique_violation, ApiError};
use crate::model::attendance::{
    status_for_check_in, worked_hours, Attendance, AttendanceWithUser,
};
use crate::models::{ExportQuery, MonthQuery};
use crate::utils::csv_export::render_csv;
use crate::utils::summary::{month_range, summarize};
use actix_web::{web, HttpResponse, Responder};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::json;
use sqlx::SqlitePool;

/// Wall-clock date and time-of-day, truncated to whole seconds.
fn local_now() -> (NaiveDate, NaiveTime) {
    let now: NaiveDateTime = Local::now().naive_local();
    let time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());
    (now.date(), time)
}

async fn record_for_day(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<Attendance>, ApiError> {
    let record = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    responses(
        (status = 201, description = "Checked in", body = Object, example = json!({
            "message": "Checked in"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    let (today, now) = local_now();

    if record_for_day(pool.get_ref(), auth.user_id, today)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Already checked in".into()));
    }

    let status = status_for_check_in(now, config.late_cutoff);

    let result = sqlx::query_as::<_, Attendance>(
        r#"
        INSERT INTO attendance (user_id, date, check_in_time, status, total_hours)
        VALUES (?, ?, ?, ?, 0)
        RETURNING id, user_id, date, check_in_time, check_out_time, status, total_hours
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .bind(now)
    .bind(status)
    .fetch_one(pool.get_ref())
    .await;

    match result {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "message": "Checked in",
            "record": record,
        }))),
        // Two concurrent check-ins can both pass the lookup above; the
        // UNIQUE(user_id, date) constraint decides the winner.
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::Conflict("Already checked in".into()))
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = auth.user_id, "Check-in failed");
            Err(ApiError::Internal)
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    responses(
        (status = 200, description = "Checked out", body = Object, example = json!({
            "message": "Checked out"
        })),
        (status = 400, description = "No check-in today or already checked out"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let (today, now) = local_now();

    let record = record_for_day(pool.get_ref(), auth.user_id, today)
        .await?
        .ok_or_else(|| ApiError::Validation("No check-in today".into()))?;

    if record.check_out_time.is_some() {
        return Err(ApiError::Conflict("Already checked out".into()));
    }

    let total_hours = worked_hours(
        record.date,
        record.check_in_time,
        NaiveDateTime::new(today, now),
    );

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        UPDATE attendance
        SET check_out_time = ?, total_hours = ?
        WHERE id = ?
        RETURNING id, user_id, date, check_in_time, check_out_time, status, total_hours
        "#,
    )
    .bind(now)
    .bind(total_hours)
    .bind(record.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out",
        "record": record,
    })))
}

/// Today's own status
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's check-in state", body = Object, example = json!({
            "checkedIn": true,
            "status": "present",
            "checkInTime": "09:02:11",
            "checkOutTime": null
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let (today, _) = local_now();

    let record = record_for_day(pool.get_ref(), auth.user_id, today).await?;

    match record {
        None => Ok(HttpResponse::Ok().json(json!({ "checkedIn": false }))),
        Some(record) => Ok(HttpResponse::Ok().json(json!({
            "checkedIn": true,
            "status": record.status,
            "checkInTime": record.check_in_time,
            "checkOutTime": record.check_out_time,
        }))),
    }
}

/// Own history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/my-history",
    responses((status = 200, description = "Own records, newest first", body = [Attendance])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_history(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Own monthly summary
#[utoipa::path(
    get,
    path = "/api/attendance/my-summary",
    params(MonthQuery),
    responses(
        (status = 200, description = "Counts and hours for the month", body = crate::utils::summary::AttendanceSummary),
        (status = 400, description = "Missing or invalid month/year")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_summary(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder, ApiError> {
    let (month, year) = match (&query.month, &query.year) {
        (Some(m), Some(y)) => (m, y),
        _ => return Err(ApiError::Validation("Month & year required".into())),
    };

    let month: u32 = month
        .parse()
        .map_err(|_| ApiError::Validation("Invalid month or year".into()))?;
    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::Validation("Invalid month or year".into()))?;

    let (start, end) =
        month_range(year, month).ok_or_else(|| ApiError::Validation("Invalid month or year".into()))?;

    let records = records_between(pool.get_ref(), auth.user_id, start, end).await?;

    Ok(HttpResponse::Ok().json(summarize(&records)))
}

pub(crate) async fn records_between(
    pool: &SqlitePool,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Attendance>, ApiError> {
    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

const JOINED_COLUMNS: &str = r#"
    a.id, a.user_id, a.date, a.check_in_time, a.check_out_time, a.status, a.total_hours,
    u.name, u.email, u.employee_id, u.department
"#;

/// All records with the owning user joined (manager)
#[utoipa::path(
    get,
    path = "/api/attendance/all",
    responses(
        (status = 200, description = "Every record with user fields joined", body = [AttendanceWithUser]),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn all_attendance(pool: web::Data<SqlitePool>) -> Result<impl Responder, ApiError> {
    let records = sqlx::query_as::<_, AttendanceWithUser>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        ORDER BY a.date DESC
        "#
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// One employee's history (manager)
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{id}",
    params(("id", description = "User id")),
    responses(
        (status = 200, description = "Records for one employee, newest first", body = [Attendance]),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_history(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let user_id = path.into_inner();

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Who has checked in today (manager)
#[utoipa::path(
    get,
    path = "/api/attendance/today-status",
    responses(
        (status = 200, description = "Today's records with user fields joined", body = [AttendanceWithUser]),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn team_today_status(pool: web::Data<SqlitePool>) -> Result<impl Responder, ApiError> {
    let (today, _) = local_now();

    let records = sqlx::query_as::<_, AttendanceWithUser>(&format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ?
        "#
    ))
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Team summary for today (manager). Employees without a record are
/// implicitly absent; absent rows are never stored.
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    responses(
        (status = 200, description = "Team counts for today", body = Object, example = json!({
            "totalEmployees": 12, "present": 8, "late": 2, "absent": 2
        })),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn team_summary(pool: web::Data<SqlitePool>) -> Result<impl Responder, ApiError> {
    let (today, _) = local_now();

    let total_employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'employee'",
    )
    .fetch_one(pool.get_ref())
    .await?;

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE date = ?
        "#,
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    let summary = summarize(&records);
    let absent = (total_employees - records.len() as i64).max(0);

    Ok(HttpResponse::Ok().json(json!({
        "totalEmployees": total_employees,
        "present": summary.present,
        "late": summary.late,
        "absent": absent,
    })))
}

/// CSV export, optionally filtered by date range and/or one employee (manager)
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_csv(
    pool: web::Data<SqlitePool>,
    query: web::Query<ExportQuery>,
) -> Result<impl Responder, ApiError> {
    let mut sql = format!(
        r#"
        SELECT {JOINED_COLUMNS}
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        "#
    );

    let mut clauses: Vec<&str> = Vec::new();
    if query.start.is_some() && query.end.is_some() {
        clauses.push("a.date BETWEEN ? AND ?");
    }
    if query.employee_id.is_some() {
        clauses.push("a.user_id = ?");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY a.date DESC");

    let mut data_query = sqlx::query_as::<_, AttendanceWithUser>(&sql);
    if let (Some(start), Some(end)) = (query.start, query.end) {
        data_query = data_query.bind(start).bind(end);
    }
    if let Some(employee_id) = query.employee_id {
        data_query = data_query.bind(employee_id);
    }

    let records = data_query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(render_csv(&records)))
}
