//! Normalized metric and metric history repositories

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{MetricHistoryPoint, NormalizedMetricRow};

/// Upsert the latest normalized state of a metric
#[allow(clippy::too_many_arguments)]
pub async fn upsert_metric(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    metric_name: &str,
    raw_value: f64,
    normalized_value: f64,
    metric_type: &str,
    weight: f64,
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO normalized_metrics (user_id, integration_id, metric_name, raw_value, normalized_value, metric_type, weight, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, integration_id, metric_name) DO UPDATE SET
            raw_value = excluded.raw_value,
            normalized_value = excluded.normalized_value,
            metric_type = excluded.metric_type,
            weight = excluded.weight,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(metric_name)
    .bind(raw_value)
    .bind(normalized_value)
    .bind(metric_type)
    .bind(weight)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// List the latest normalized metrics for a unit
pub async fn list_for_unit(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
) -> Result<Vec<NormalizedMetricRow>, SqliteError> {
    let rows = sqlx::query_as::<_, NormalizedMetricRow>(
        "SELECT * FROM normalized_metrics WHERE user_id = ? AND integration_id = ? ORDER BY metric_name",
    )
    .bind(user_id)
    .bind(integration_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Append one point to a metric time series
pub async fn append_history(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    metric_name: &str,
    value: f64,
    recorded_at: i64,
) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO metric_history (id, user_id, integration_id, metric_name, value, recorded_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cuid2::create_id())
    .bind(user_id)
    .bind(integration_id)
    .bind(metric_name)
    .bind(value)
    .bind(recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the most recent `limit` points of a metric series, oldest first
pub async fn history(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    metric_name: &str,
    limit: u32,
) -> Result<Vec<MetricHistoryPoint>, SqliteError> {
    let mut rows = sqlx::query_as::<_, MetricHistoryPoint>(
        r#"
        SELECT value, recorded_at
        FROM metric_history
        WHERE user_id = ? AND integration_id = ? AND metric_name = ?
        ORDER BY recorded_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(metric_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    #[tokio::test]
    async fn test_upsert_metric_overwrites() {
        let pool = setup_test_pool().await;

        upsert_metric(&pool, "u", "i", "activity", 500.0, 50.0, "count", 0.25)
            .await
            .unwrap();
        upsert_metric(&pool, "u", "i", "activity", 800.0, 80.0, "count", 0.3)
            .await
            .unwrap();

        let rows = list_for_unit(&pool, "u", "i").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].raw_value, 800.0);
        assert_eq!(rows[0].normalized_value, 80.0);
        assert_eq!(rows[0].weight, 0.3);
    }

    #[tokio::test]
    async fn test_history_oldest_first_with_limit() {
        let pool = setup_test_pool().await;

        for (i, value) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
            append_history(&pool, "u", "i", "activity", *value, 100 + i as i64)
                .await
                .unwrap();
        }

        let points = history(&pool, "u", "i", "activity", 3).await.unwrap();
        assert_eq!(points.len(), 3);
        // Most recent 3 points, in chronological order
        assert_eq!(points[0].value, 20.0);
        assert_eq!(points[2].value, 40.0);
    }

    #[tokio::test]
    async fn test_history_empty_series() {
        let pool = setup_test_pool().await;
        let points = history(&pool, "u", "i", "missing", 10).await.unwrap();
        assert!(points.is_empty());
    }
}
