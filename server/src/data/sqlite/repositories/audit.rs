//! Recalibration audit repository (append-only)

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::AuditRow;

/// Record the outcome of one processed unit
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    trigger_type: &str,
    status: &str,
    failure_kind: Option<&str>,
    detail: Option<&str>,
    duration_ms: i64,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO recalibration_audit (id, user_id, integration_id, trigger_type, status, failure_kind, detail, duration_ms, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cuid2::create_id())
    .bind(user_id)
    .bind(integration_id)
    .bind(trigger_type)
    .bind(status)
    .bind(failure_kind)
    .bind(detail)
    .bind(duration_ms)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// List audit rows for a unit, newest first
pub async fn list_for_unit(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    limit: u32,
) -> Result<Vec<AuditRow>, SqliteError> {
    let rows = sqlx::query_as::<_, AuditRow>(
        r#"
        SELECT *
        FROM recalibration_audit
        WHERE user_id = ? AND integration_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = setup_test_pool().await;

        insert(
            &pool,
            "u",
            "i",
            "manual_recalibration",
            "success",
            None,
            None,
            120,
        )
        .await
        .unwrap();
        insert(
            &pool,
            "u",
            "i",
            "scheduled_recalibration",
            "failed",
            Some("timeout"),
            Some("unit timed out after 8s"),
            8000,
        )
        .await
        .unwrap();

        let rows = list_for_unit(&pool, "u", "i", 10).await.unwrap();
        assert_eq!(rows.len(), 2);

        let failed = rows.iter().find(|r| r.status == "failed").unwrap();
        assert_eq!(failed.failure_kind.as_deref(), Some("timeout"));
        assert_eq!(failed.trigger_type, "scheduled_recalibration");
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let pool = setup_test_pool().await;

        for _ in 0..5 {
            insert(&pool, "u", "i", "manual_recalibration", "success", None, None, 10)
                .await
                .unwrap();
        }

        let rows = list_for_unit(&pool, "u", "i", 3).await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}
