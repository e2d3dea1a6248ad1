use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{is_unique_violation, ApiError},
    model::{role::Role, user::User},
    models::{LoginReq, RegisterReq, UpdateProfileReq, UserResponse},
    utils::{email_cache, email_filter},
};
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

/// Inserts a new user and keeps the e-mail filter and cache populated.
async fn insert_user(
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    department: Option<&str>,
    pool: &SqlitePool,
) -> Result<UserResponse, ApiError> {
    let hashed = hash_password(password);
    let employee_id = format!("EMP{}", Utc::now().timestamp_millis());

    let result = sqlx::query_as::<_, UserResponse>(
        r#"
        INSERT INTO users (name, email, password, role, employee_id, department)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, name, email, role, employee_id, department
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(&hashed)
    .bind(role)
    .bind(&employee_id)
    .bind(department)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => {
            // if insert succeeds, populate filter and keep cache warm
            email_filter::insert(email);
            email_cache::mark_taken(email).await;
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::Conflict("User already exists".into()))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to register user");
            Err(ApiError::Internal)
        }
    }
}

/// true  => e-mail AVAILABLE
/// false => e-mail TAKEN
pub async fn is_email_available(email: &str, pool: &SqlitePool) -> bool {
    let email = email.to_lowercase();

    // Cuckoo filter — fast negative
    if !email_filter::might_exist(&email) {
        return true;
    }

    // Moka cache — fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered, token issued"),
        (status = 400, description = "Missing fields or duplicate e-mail", body = Object, example = json!({
            "message": "User already exists"
        }))
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    // Role is fixed at creation time; nothing mutates it afterwards.
    let role = payload.role.unwrap_or(Role::Employee);

    let user = insert_user(
        name,
        &email,
        &payload.password,
        role,
        payload.department.as_deref(),
        pool.get_ref(),
    )
    .await?;

    let token = generate_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.token_ttl,
    );

    Ok(HttpResponse::Created().json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "employeeId": user.employee_id,
        "token": token,
    })))
}

/// Login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful, token issued"),
        (status = 400, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, payload), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReq>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<impl Responder, ApiError> {
    info!("Login request received");

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::Validation("Email and password required".into()));
    }

    debug!("Fetching user from database");

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, role, employee_id, department
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        info!("Invalid credentials: user not found");
        ApiError::Validation("Invalid credentials".into())
    })?;

    debug!("Verifying password");

    if !verify_password(&payload.password, &user.password) {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::Validation("Invalid credentials".into()));
    }

    // Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = datetime('now') WHERE id = ?")
        .bind(user.id)
        .execute(pool.get_ref())
        .await
    {
        tracing::error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    let token = generate_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.token_ttl,
    );

    info!("Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "employeeId": user.employee_id,
        "token": token,
    })))
}

/// Current user, without the password hash.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let user = sqlx::query_as::<_, UserResponse>(
        r#"
        SELECT id, name, email, role, employee_id, department
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Self-service profile update: name, e-mail and department only.
#[utoipa::path(
    put,
    path = "/api/auth/update",
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = Object, example = json!({
            "message": "Profile updated successfully"
        })),
        (status = 400, description = "Missing fields or e-mail already in use"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    auth: AuthUser,
    payload: web::Json<UpdateProfileReq>,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() {
        return Err(ApiError::Validation("Name and email are required".into()));
    }

    let taken_by_other = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id != ? LIMIT 1)",
    )
    .bind(&email)
    .bind(auth.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    if taken_by_other {
        return Err(ApiError::Conflict("Email already in use".into()));
    }

    let user = sqlx::query_as::<_, UserResponse>(
        r#"
        UPDATE users
        SET name = ?, email = ?, department = ?
        WHERE id = ?
        RETURNING id, name, email, role, employee_id, department
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(payload.department.as_deref())
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // the old address stays in the filter; false positives are tolerated
    if email != auth.email {
        email_filter::insert(&email);
        email_cache::mark_taken(&email).await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}
