//! Adaptive weighting repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::WeightingRow;

/// Weight fields as produced by a recalibration
#[derive(Debug, Clone)]
pub struct WeightUpdate {
    pub metric_name: String,
    pub base_weight: f64,
    pub final_weight: f64,
    pub variance: f64,
    pub confidence: f64,
    pub adjustment_reason: String,
}

/// Upsert all weights for a unit in a single transaction
pub async fn upsert_all(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    weights: &[WeightUpdate],
) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for w in weights {
        sqlx::query(
            r#"
            INSERT INTO weightings (user_id, integration_id, metric_name, base_weight, final_weight, variance, confidence, adjustment_reason, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, integration_id, metric_name) DO UPDATE SET
                base_weight = excluded.base_weight,
                final_weight = excluded.final_weight,
                variance = excluded.variance,
                confidence = excluded.confidence,
                adjustment_reason = excluded.adjustment_reason,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(integration_id)
        .bind(&w.metric_name)
        .bind(w.base_weight)
        .bind(w.final_weight)
        .bind(w.variance)
        .bind(w.confidence)
        .bind(&w.adjustment_reason)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// List the latest weights for a unit
pub async fn list_for_unit(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
) -> Result<Vec<WeightingRow>, SqliteError> {
    let rows = sqlx::query_as::<_, WeightingRow>(
        "SELECT * FROM weightings WHERE user_id = ? AND integration_id = ? ORDER BY metric_name",
    )
    .bind(user_id)
    .bind(integration_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    fn make_weight(name: &str, final_weight: f64) -> WeightUpdate {
        WeightUpdate {
            metric_name: name.to_string(),
            base_weight: 0.25,
            final_weight,
            variance: 0.1,
            confidence: 0.9,
            adjustment_reason: "balanced".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_all_and_list() {
        let pool = setup_test_pool().await;

        upsert_all(
            &pool,
            "u",
            "i",
            &[make_weight("activity", 0.3), make_weight("throughput", 0.2)],
        )
        .await
        .unwrap();

        let rows = list_for_unit(&pool, "u", "i").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].metric_name, "activity");
        assert_eq!(rows[0].final_weight, 0.3);
    }

    #[tokio::test]
    async fn test_upsert_all_overwrites() {
        let pool = setup_test_pool().await;

        upsert_all(&pool, "u", "i", &[make_weight("activity", 0.3)])
            .await
            .unwrap();
        upsert_all(&pool, "u", "i", &[make_weight("activity", 0.5)])
            .await
            .unwrap();

        let rows = list_for_unit(&pool, "u", "i").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].final_weight, 0.5);
    }
}
