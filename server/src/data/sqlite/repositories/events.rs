//! Raw event repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::RawEvent;

/// Event fields as accepted for ingestion (id and created_at are assigned here)
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub event_type: String,
    pub occurred_at: i64,
    pub metadata: Option<String>,
}

/// Insert a batch of events in a single transaction
/// Returns the number of rows inserted
pub async fn insert_events(pool: &SqlitePool, events: &[NewEvent]) -> Result<u64, SqliteError> {
    if events.is_empty() {
        return Ok(0);
    }

    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for event in events {
        sqlx::query(
            r#"
            INSERT INTO events (id, user_id, integration_id, service_name, event_type, occurred_at, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(cuid2::create_id())
        .bind(&event.user_id)
        .bind(&event.integration_id)
        .bind(&event.service_name)
        .bind(&event.event_type)
        .bind(event.occurred_at)
        .bind(&event.metadata)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(events.len() as u64)
}

/// List events for a unit in [start, end)
pub async fn list_window(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    start: i64,
    end: i64,
) -> Result<Vec<RawEvent>, SqliteError> {
    let rows = sqlx::query_as::<_, RawEvent>(
        r#"
        SELECT id, user_id, integration_id, service_name, event_type, occurred_at, metadata, created_at
        FROM events
        WHERE user_id = ? AND integration_id = ? AND occurred_at >= ? AND occurred_at < ?
        ORDER BY occurred_at ASC
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count events for a unit in [start, end)
pub async fn count_between(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    start: i64,
    end: i64,
) -> Result<i64, SqliteError> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM events
        WHERE user_id = ? AND integration_id = ? AND occurred_at >= ? AND occurred_at < ?
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
