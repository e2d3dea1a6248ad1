use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    create_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    pool
}

/// Idempotent schema bootstrap. UNIQUE(user_id, date) is what makes
/// concurrent double check-in lose at the store layer.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            name          TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            role          TEXT NOT NULL DEFAULT 'employee',
            employee_id   TEXT NOT NULL UNIQUE,
            department    TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            last_login_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER NOT NULL REFERENCES users(id),
            date           TEXT NOT NULL,
            check_in_time  TEXT NOT NULL,
            check_out_time TEXT,
            status         TEXT NOT NULL,
            total_hours    REAL NOT NULL DEFAULT 0,
            UNIQUE(user_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)")
        .execute(pool)
        .await?;

    Ok(())
}
