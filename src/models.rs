use crate::model::role::Role;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub password: String,
    /// Defaults to employee when omitted. Immutable after creation.
    #[serde(default)]
    pub role: Option<Role>,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileReq {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
}

/// User as returned to clients. The password hash never leaves the store
/// layer through this type.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[schema(example = "EMP1754450000000")]
    pub employee_id: String,
    pub department: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// E-mail address of the token owner.
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    #[schema(example = "02")]
    pub month: Option<String>,
    #[schema(example = "2026")]
    pub year: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[schema(example = "2026-08-01", value_type = Option<String>, format = "date")]
    pub start: Option<NaiveDate>,
    #[schema(example = "2026-08-31", value_type = Option<String>, format = "date")]
    pub end: Option<NaiveDate>,
    /// Restrict the export to a single user id.
    pub employee_id: Option<i64>,
}
