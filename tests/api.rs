use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{test, App};
use attendance_tracker::{config::Config, db, routes};
use chrono::{Datelike, Local, NaiveTime};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        late_cutoff: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    }
}

/// Single-connection pool: every connection to `sqlite::memory:` would
/// otherwise get its own empty database.
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::create_schema(&pool).await.expect("schema");
    pool
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

macro_rules! init_app {
    ($pool:expr, $config:expr) => {{
        let config = $config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new($pool.clone()))
                .app_data(Data::new(config.clone()))
                .configure(move |cfg| routes::configure(cfg, config.clone())),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        test::call_service(&$app, $req.peer_addr(peer()).to_request()).await
    }};
}

macro_rules! register {
    ($app:expr, $email:expr, $role:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post().uri("/auth/register").set_json(json!({
                "name": "Test User",
                "email": $email,
                "password": "secret123",
                "role": $role,
            }))
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

macro_rules! bearer {
    ($token:expr) => {
        ("Authorization", format!("Bearer {}", $token))
    };
}

#[actix_web::test]
async fn register_returns_user_and_token() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "reg1@test.io", "employee");

    assert_eq!(body["email"], "reg1@test.io");
    assert_eq!(body["role"], "employee");
    assert!(body["employeeId"].as_str().unwrap().starts_with("EMP"));
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body.get("password").is_none());
}

#[actix_web::test]
async fn register_rejects_duplicate_email_and_missing_fields() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let _ = register!(app, "dup@test.io", "employee");

    let resp = send!(
        app,
        test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": "Other", "email": "dup@test.io", "password": "x",
        }))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User already exists");

    let resp = send!(
        app,
        test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": "", "email": "", "password": "",
        }))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_succeeds_and_rejects_bad_password() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let _ = register!(app, "login@test.io", "employee");

    let resp = send!(
        app,
        test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "login@test.io", "password": "secret123",
        }))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["token"].as_str().unwrap().is_empty());

    let resp = send!(
        app,
        test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "login@test.io", "password": "wrong",
        }))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[actix_web::test]
async fn me_returns_user_without_password_hash() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "me@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["email"], "me@test.io");
    assert!(me.get("password").is_none());
}

#[actix_web::test]
async fn protected_routes_require_a_valid_token() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let resp = send!(app, test::TestRequest::get().uri("/api/attendance/today"));
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
    );
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn update_profile_changes_fields_and_guards_email() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let _ = register!(app, "taken@test.io", "employee");
    let body = register!(app, "update@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri("/api/auth/update")
            .insert_header(bearer!(token))
            .set_json(json!({
                "name": "Renamed",
                "email": "update@test.io",
                "department": "Support",
            }))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["name"], "Renamed");
    assert_eq!(body["user"]["department"], "Support");

    // Someone else's address is off limits
    let resp = send!(
        app,
        test::TestRequest::put()
            .uri("/api/auth/update")
            .insert_header(bearer!(token))
            .set_json(json!({
                "name": "Renamed",
                "email": "taken@test.io",
            }))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Email already in use");
}

#[actix_web::test]
async fn check_in_creates_one_record_per_day() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "checkin@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let status = body["record"]["status"].as_str().unwrap();
    assert!(status == "present" || status == "late");
    assert_eq!(body["record"]["totalHours"], 0.0);

    // Second check-in the same day is rejected and nothing is written
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Already checked in");

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-history")
            .insert_header(bearer!(token))
    );
    let history: Value = test::read_body_json(resp).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn check_out_requires_check_in_and_happens_once() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "checkout@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No check-in today");

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["record"]["checkOutTime"].is_string());
    // Checked out within the same second; no hours accrued
    assert_eq!(body["record"]["totalHours"], 0.0);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkout")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Already checked out");
}

#[actix_web::test]
async fn today_reflects_check_in_state() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "today@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(bearer!(token))
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["checkedIn"], false);

    let _ = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(token))
    );

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(bearer!(token))
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["checkedIn"], true);
    assert!(body["checkInTime"].is_string());
    assert!(body["checkOutTime"].is_null());
}

#[actix_web::test]
async fn my_summary_validates_params_and_counts_records() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "summary@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-summary")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/my-summary?month=13&year=2026")
            .insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let _ = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(token))
    );

    let today = Local::now().date_naive();
    let uri = format!(
        "/api/attendance/my-summary?month={}&year={}",
        today.month(),
        today.year()
    );
    let resp = send!(
        app,
        test::TestRequest::get().uri(&uri).insert_header(bearer!(token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    let counted = summary["present"].as_u64().unwrap() + summary["late"].as_u64().unwrap();
    assert_eq!(counted, 1);
    assert_eq!(summary["halfDay"], 0);
    assert_eq!(summary["totalHours"], 0.0);
}

#[actix_web::test]
async fn manager_routes_reject_employees() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let body = register!(app, "emp-forbidden@test.io", "employee");
    let token = body["token"].as_str().unwrap();

    for uri in [
        "/api/attendance/all",
        "/api/attendance/employee/1",
        "/api/attendance/today-status",
        "/api/attendance/summary",
        "/api/attendance/export",
        "/api/dashboard/manager",
    ] {
        let resp = send!(
            app,
            test::TestRequest::get().uri(uri).insert_header(bearer!(token))
        );
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Access denied");
    }
}

#[actix_web::test]
async fn manager_sees_team_views() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let emp = register!(app, "team-emp@test.io", "employee");
    let emp_token = emp["token"].as_str().unwrap();
    let emp_id = emp["id"].as_i64().unwrap();

    let mgr = register!(app, "team-mgr@test.io", "manager");
    let mgr_token = mgr["token"].as_str().unwrap();

    // Before anyone checks in: one employee, implicitly absent
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/summary")
            .insert_header(bearer!(mgr_token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["totalEmployees"], 1);
    assert_eq!(summary["absent"], 1);
    assert_eq!(summary["present"], 0);

    let _ = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(emp_token))
    );

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/summary")
            .insert_header(bearer!(mgr_token))
    );
    let summary: Value = test::read_body_json(resp).await;
    assert_eq!(summary["absent"], 0);
    let counted = summary["present"].as_u64().unwrap() + summary["late"].as_u64().unwrap();
    assert_eq!(counted, 1);

    // All records come back with the user joined
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/all")
            .insert_header(bearer!(mgr_token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let all: Value = test::read_body_json(resp).await;
    let rows = all.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "team-emp@test.io");

    // Single-employee history
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/attendance/employee/{emp_id}"))
            .insert_header(bearer!(mgr_token))
    );
    let history: Value = test::read_body_json(resp).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // Today's team status
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/today-status")
            .insert_header(bearer!(mgr_token))
    );
    let today: Value = test::read_body_json(resp).await;
    assert_eq!(today.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn export_renders_csv_attachment() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let emp = register!(app, "csv-emp@test.io", "employee");
    let emp_token = emp["token"].as_str().unwrap();
    let emp_id = emp["id"].as_i64().unwrap();
    let mgr = register!(app, "csv-mgr@test.io", "manager");
    let mgr_token = mgr["token"].as_str().unwrap();

    let _ = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(emp_token))
    );

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/export")
            .insert_header(bearer!(mgr_token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        "text/csv"
    );
    assert!(resp
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("attendance.csv"));
    let body = test::read_body(resp).await;
    let csv = std::str::from_utf8(&body).unwrap();
    assert!(csv.starts_with("Employee ID,Name,Date,Status,CheckIn,CheckOut,Hours\n"));
    assert_eq!(csv.lines().count(), 2);

    // Filtering by another employee id yields just the header
    let resp = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/attendance/export?employeeId={}", emp_id + 999))
            .insert_header(bearer!(mgr_token))
    );
    let body = test::read_body(resp).await;
    assert_eq!(std::str::from_utf8(&body).unwrap().lines().count(), 1);
}

#[actix_web::test]
async fn dashboards_summarize_the_day() {
    let (pool, config) = (test_pool().await, test_config());
    let app = init_app!(pool, config);

    let emp = register!(app, "dash-emp@test.io", "employee");
    let emp_token = emp["token"].as_str().unwrap();
    let mgr = register!(app, "dash-mgr@test.io", "manager");
    let mgr_token = mgr["token"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/dashboard/manager")
            .insert_header(bearer!(mgr_token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let dash: Value = test::read_body_json(resp).await;
    assert_eq!(dash["totalEmployees"], 1);
    assert_eq!(dash["absent"], 1);
    assert_eq!(dash["absentEmployees"][0]["name"], "Test User");

    let _ = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(bearer!(emp_token))
    );

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/dashboard/manager")
            .insert_header(bearer!(mgr_token))
    );
    let dash: Value = test::read_body_json(resp).await;
    assert_eq!(dash["absent"], 0);
    assert_eq!(dash["absentEmployees"].as_array().unwrap().len(), 0);

    let resp = send!(
        app,
        test::TestRequest::get()
            .uri("/api/dashboard/employee")
            .insert_header(bearer!(emp_token))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let dash: Value = test::read_body_json(resp).await;
    assert_eq!(dash["todayStatus"]["userId"], emp["id"]);
    assert_eq!(dash["recentAttendance"].as_array().unwrap().len(), 1);
    let month = &dash["monthlySummary"];
    let counted = month["present"].as_u64().unwrap() + month["late"].as_u64().unwrap();
    assert_eq!(counted, 1);
}
