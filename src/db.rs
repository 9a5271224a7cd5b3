use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::model::role::Role;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS departments (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS positions (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_code VARCHAR(32) NOT NULL UNIQUE,
        name VARCHAR(150) NOT NULL,
        department_id BIGINT UNSIGNED NULL,
        position_id BIGINT UNSIGNED NULL,
        rfid_tag VARCHAR(64) NOT NULL UNIQUE,
        photo_url VARCHAR(255) NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'active',
        FOREIGN KEY (department_id) REFERENCES departments(id),
        FOREIGN KEY (position_id) REFERENCES positions(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance_logs (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        employee_id BIGINT UNSIGNED NOT NULL,
        log_type VARCHAR(3) NOT NULL,
        logged_at DATETIME(6) NOT NULL,
        INDEX idx_attendance_employee_time (employee_id, logged_at),
        INDEX idx_attendance_time (logged_at),
        FOREIGN KEY (employee_id) REFERENCES employees(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(64) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL,
        name VARCHAR(150) NOT NULL,
        role_id TINYINT UNSIGNED NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        role_id TINYINT UNSIGNED NOT NULL,
        module VARCHAR(32) NOT NULL,
        can_access BOOLEAN NOT NULL DEFAULT FALSE,
        can_read BOOLEAN NOT NULL DEFAULT FALSE,
        can_write BOOLEAN NOT NULL DEFAULT FALSE,
        can_delete BOOLEAN NOT NULL DEFAULT FALSE,
        can_export BOOLEAN NOT NULL DEFAULT FALSE,
        PRIMARY KEY (role_id, module)
    )
    "#,
];

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    for statement in DDL {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    info!(tables = DDL.len(), "Schema ready");
    Ok(())
}

/// Creates the `admin` account when the users table is empty.
pub async fn bootstrap_admin(pool: &MySqlPool, password: &str) -> Result<()> {
    let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if users > 0 {
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hash failed: {e}"))?;

    sqlx::query(r#"INSERT INTO users (username, password, name, role_id) VALUES (?, ?, ?, ?)"#)
        .bind("admin")
        .bind(hashed)
        .bind("Administrator")
        .bind(Role::Admin.id())
        .execute(pool)
        .await
        .context("Failed to create admin user")?;

    info!("Bootstrapped admin account");
    Ok(())
}
