use crate::api::attendance::records_between;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{Attendance, AttendanceStatus, AttendanceWithUser};
use crate::utils::summary::{month_range_of, summarize};
use actix_web::{web, HttpResponse, Responder};
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbsentEmployee {
    pub id: i64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "EMP1754450000000")]
    pub employee_id: String,
}

/// Employee dashboard: today's record, current-month summary, last 7 records.
#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    responses(
        (status = 200, description = "Today + month + recent attendance", body = Object, example = json!({
            "todayStatus": null,
            "monthlySummary": { "present": 0, "absent": 0, "late": 0, "halfDay": 0, "totalHours": 0.0 },
            "recentAttendance": []
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn employee_dashboard(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let today = Local::now().date_naive();

    let today_record = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    let (start, end) = month_range_of(today).ok_or(ApiError::Internal)?;
    let month_records = records_between(pool.get_ref(), auth.user_id, start, end).await?;

    let recent = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, date, check_in_time, check_out_time, status, total_hours
        FROM attendance
        WHERE user_id = ?
        ORDER BY date DESC
        LIMIT 7
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "todayStatus": today_record,
        "monthlySummary": summarize(&month_records),
        "recentAttendance": recent,
    })))
}

/// Manager dashboard: today's team counts plus who is absent.
#[utoipa::path(
    get,
    path = "/api/dashboard/manager",
    responses(
        (status = 200, description = "Team counts and absent employees", body = Object, example = json!({
            "totalEmployees": 12, "present": 8, "late": 2, "absent": 2,
            "absentEmployees": [{ "id": 3, "name": "John Doe", "employeeId": "EMP1754450000000" }]
        })),
        (status = 403, description = "Manager only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn manager_dashboard(pool: web::Data<SqlitePool>) -> Result<impl Responder, ApiError> {
    let today = Local::now().date_naive();

    let total_employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'employee'",
    )
    .fetch_one(pool.get_ref())
    .await?;

    let today_records = sqlx::query_as::<_, AttendanceWithUser>(
        r#"
        SELECT a.id, a.user_id, a.date, a.check_in_time, a.check_out_time, a.status, a.total_hours,
               u.name, u.email, u.employee_id, u.department
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ?
        "#,
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    let present = today_records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    let late = today_records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count();
    let absent = (total_employees - today_records.len() as i64).max(0);

    let absent_employees = sqlx::query_as::<_, AbsentEmployee>(
        r#"
        SELECT id, name, employee_id
        FROM users
        WHERE role = 'employee'
          AND id NOT IN (SELECT user_id FROM attendance WHERE date = ?)
        "#,
    )
    .bind(today)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "totalEmployees": total_employees,
        "present": present,
        "late": late,
        "absent": absent,
        "absentEmployees": absent_employees,
    })))
}
