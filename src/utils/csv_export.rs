use crate::model::attendance::AttendanceWithUser;
use std::borrow::Cow;

const HEADER: &str = "Employee ID,Name,Date,Status,CheckIn,CheckOut,Hours";

/// Quote a field if it contains the delimiter, a quote, or a line break.
/// Embedded quotes are doubled per RFC 4180.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Render a record set as CSV: header row, one row per record, each row
/// newline-terminated. Missing checkout renders blank, zero hours render
/// as `0`.
pub fn render_csv(records: &[AttendanceWithUser]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(HEADER);
    out.push('\n');

    for record in records {
        let check_out = record
            .check_out_time
            .map(|t| t.to_string())
            .unwrap_or_default();

        out.push_str(&escape(&record.employee_id));
        out.push(',');
        out.push_str(&escape(&record.name));
        out.push(',');
        out.push_str(&record.date.to_string());
        out.push(',');
        out.push_str(&record.status.to_string());
        out.push(',');
        out.push_str(&record.check_in_time.to_string());
        out.push(',');
        out.push_str(&escape(&check_out));
        out.push(',');
        out.push_str(&record.total_hours.to_string());
        out.push('\n');
    }

    out
}
