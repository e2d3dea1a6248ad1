use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum AttendanceStatus {
    Present,
    Late,
    /// Derived by set difference, never written by check-in.
    Absent,
    /// Reserved value, no operation produces it yet.
    HalfDay,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 1)]
    pub user_id: i64,
    #[schema(example = "2026-08-06", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:02:11", value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(example = "17:30:00", value_type = String, nullable = true)]
    pub check_out_time: Option<NaiveTime>,
    #[schema(example = "present")]
    pub status: AttendanceStatus,
    #[schema(example = 8.47)]
    pub total_hours: f64,
}

/// Attendance row joined with the owning user, for manager views and export.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceWithUser {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "2026-08-06", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:02:11", value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(example = "17:30:00", value_type = String, nullable = true)]
    pub check_out_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub total_hours: f64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "EMP1754450000000")]
    pub employee_id: String,
    pub department: Option<String>,
}

/// Check-ins at or before the cutoff count as present, anything later is late.
pub fn status_for_check_in(checked_in_at: NaiveTime, cutoff: NaiveTime) -> AttendanceStatus {
    if checked_in_at <= cutoff {
        AttendanceStatus::Present
    } else {
        AttendanceStatus::Late
    }
}

/// Hours between check-in and check-out, rounded to 2 decimal places.
/// Clamped at zero; a checkout is never allowed to produce negative hours.
pub fn worked_hours(date: NaiveDate, check_in: NaiveTime, checked_out_at: NaiveDateTime) -> f64 {
    let started_at = NaiveDateTime::new(date, check_in);
    let millis = (checked_out_at - started_at).num_milliseconds() as f64;
    round2((millis / 3_600_000.0).max(0.0))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
