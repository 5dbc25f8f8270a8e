//! Integration registry repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::IntegrationRow;

/// Register or refresh an integration (idempotent)
///
/// Re-registering updates service_name and category but preserves the
/// enabled flag.
pub async fn upsert(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    service_name: &str,
    category: &str,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO integrations (user_id, integration_id, service_name, category, enabled, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        ON CONFLICT (user_id, integration_id) DO UPDATE SET
            service_name = excluded.service_name,
            category = excluded.category,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(service_name)
    .bind(category)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a single integration
pub async fn get(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
) -> Result<Option<IntegrationRow>, SqliteError> {
    let row = sqlx::query_as::<_, IntegrationRow>(
        "SELECT * FROM integrations WHERE user_id = ? AND integration_id = ?",
    )
    .bind(user_id)
    .bind(integration_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List all enabled integrations (the batch work list)
pub async fn list_enabled(pool: &SqlitePool) -> Result<Vec<IntegrationRow>, SqliteError> {
    let rows = sqlx::query_as::<_, IntegrationRow>(
        "SELECT * FROM integrations WHERE enabled = 1 ORDER BY user_id, integration_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List integrations for a user
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<IntegrationRow>, SqliteError> {
    let rows = sqlx::query_as::<_, IntegrationRow>(
        "SELECT * FROM integrations WHERE user_id = ? ORDER BY integration_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Enable or disable an integration
/// Returns true if a row was updated
pub async fn set_enabled(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    enabled: bool,
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE integrations SET enabled = ?, updated_at = ? WHERE user_id = ? AND integration_id = ?",
    )
    .bind(enabled)
    .bind(now)
    .bind(user_id)
    .bind(integration_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
