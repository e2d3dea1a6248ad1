use crate::api::dashboard::AbsentEmployee;
use crate::model::attendance::{Attendance, AttendanceStatus, AttendanceWithUser};
use crate::model::role::Role;
use crate::models::{
    ExportQuery, LoginReq, MonthQuery, RegisterReq, UpdateProfileReq, UserResponse,
};
use crate::utils::summary::AttendanceSummary;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Authenticated users check in and out daily, view their own history and
monthly summaries; managers see team-wide status, summaries, dashboards
and CSV exports.

### Security
All routes under the API prefix require a **JWT Bearer token** (1 day TTL
by default). Manager-only routes additionally require the manager role.

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::update_profile,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today_status,
        crate::api::attendance::my_history,
        crate::api::attendance::my_summary,
        crate::api::attendance::all_attendance,
        crate::api::attendance::employee_history,
        crate::api::attendance::team_today_status,
        crate::api::attendance::team_summary,
        crate::api::attendance::export_csv,

        crate::api::dashboard::employee_dashboard,
        crate::api::dashboard::manager_dashboard,
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            UpdateProfileReq,
            UserResponse,
            Role,
            Attendance,
            AttendanceWithUser,
            AttendanceStatus,
            AttendanceSummary,
            AbsentEmployee,
            MonthQuery,
            ExportQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and profile APIs"),
        (name = "Attendance", description = "Check-in/out, history, summaries and export APIs"),
        (name = "Dashboard", description = "Employee and manager dashboard APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
