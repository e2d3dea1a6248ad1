use crate::model::attendance::{round2, Attendance, AttendanceStatus};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

/// Per-status counts plus total worked hours over a set of records.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub half_day: u32,
    #[schema(example = 152.75)]
    pub total_hours: f64,
}

/// Roll a record set up into a summary. Range filtering is the caller's
/// responsibility; every record handed in is counted.
pub fn summarize<'a, I>(records: I) -> AttendanceSummary
where
    I: IntoIterator<Item = &'a Attendance>,
{
    let mut summary = AttendanceSummary::default();

    for record in records {
        match record.status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::HalfDay => summary.half_day += 1,
        }
        summary.total_hours += record.total_hours;
    }

    summary.total_hours = round2(summary.total_hours);
    summary
}

/// First and last calendar day of a month. The end is computed from the
/// calendar, so February never bleeds into March.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next_month.pred_opt()?))
}

/// Month range containing the given day.
pub fn month_range_of(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    month_range(day.year(), day.month())
}
