//! Anomaly repository (append-only detection log)

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::AnomalyRow;

/// Anomaly fields as produced by the detector
#[derive(Debug, Clone)]
pub struct NewAnomaly {
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub anomaly_type: String,
    pub category: String,
    pub severity: String,
    pub confidence: f64,
    pub baseline: f64,
    pub observed: f64,
    pub deviation_pct: f64,
    pub detection_method: String,
    /// JSON array of recommended action strings
    pub recommended_actions: String,
    pub explanation: Option<String>,
}

/// Insert a batch of anomalies in a single transaction
/// Returns the generated row ids
pub async fn insert_all(
    pool: &SqlitePool,
    anomalies: &[NewAnomaly],
) -> Result<Vec<String>, SqliteError> {
    if anomalies.is_empty() {
        return Ok(Vec::new());
    }

    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(anomalies.len());

    for anomaly in anomalies {
        let id = cuid2::create_id();
        sqlx::query(
            r#"
            INSERT INTO anomalies (id, user_id, integration_id, service_name, anomaly_type, category, severity, confidence, baseline, observed, deviation_pct, detection_method, recommended_actions, explanation, detected_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&anomaly.user_id)
        .bind(&anomaly.integration_id)
        .bind(&anomaly.service_name)
        .bind(&anomaly.anomaly_type)
        .bind(&anomaly.category)
        .bind(&anomaly.severity)
        .bind(anomaly.confidence)
        .bind(anomaly.baseline)
        .bind(anomaly.observed)
        .bind(anomaly.deviation_pct)
        .bind(&anomaly.detection_method)
        .bind(&anomaly.recommended_actions)
        .bind(&anomaly.explanation)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        ids.push(id);
    }

    tx.commit().await?;
    Ok(ids)
}

/// List the most recent anomalies for a user, newest first
pub async fn list_recent(
    pool: &SqlitePool,
    user_id: &str,
    limit: u32,
) -> Result<Vec<AnomalyRow>, SqliteError> {
    let rows = sqlx::query_as::<_, AnomalyRow>(
        r#"
        SELECT *
        FROM anomalies
        WHERE user_id = ?
        ORDER BY detected_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    fn make_anomaly(severity: &str) -> NewAnomaly {
        NewAnomaly {
            user_id: "u".to_string(),
            integration_id: "i".to_string(),
            service_name: "slack".to_string(),
            anomaly_type: "latency_spike".to_string(),
            category: "performance".to_string(),
            severity: severity.to_string(),
            confidence: 90.0,
            baseline: 200.0,
            observed: 2500.0,
            deviation_pct: 1150.0,
            detection_method: "threshold".to_string(),
            recommended_actions: r#"["Check upstream service health"]"#.to_string(),
            explanation: None,
        }
    }

    #[tokio::test]
    async fn test_insert_all_returns_ids() {
        let pool = setup_test_pool().await;

        let ids = insert_all(&pool, &[make_anomaly("critical"), make_anomaly("high")])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn test_insert_empty_batch() {
        let pool = setup_test_pool().await;
        let ids = insert_all(&pool, &[]).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_respects_limit() {
        let pool = setup_test_pool().await;

        insert_all(
            &pool,
            &[
                make_anomaly("low"),
                make_anomaly("medium"),
                make_anomaly("high"),
            ],
        )
        .await
        .unwrap();

        let rows = list_recent(&pool, "u", 2).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_list_recent_scopes_to_user() {
        let pool = setup_test_pool().await;

        let mut other = make_anomaly("low");
        other.user_id = "someone-else".to_string();
        insert_all(&pool, &[make_anomaly("high"), other]).await.unwrap();

        let rows = list_recent(&pool, "u", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "u");
    }
}
