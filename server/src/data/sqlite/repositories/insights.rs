//! Insight repository
//!
//! Insights are replaced wholesale per (user, service) on every pipeline
//! run so repeated runs over the same data are idempotent.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::InsightRow;

/// Insight fields as produced by the generator
#[derive(Debug, Clone)]
pub struct NewInsight {
    pub insight_key: String,
    pub text: String,
    pub severity: String,
    pub confidence: f64,
    pub metadata: Option<String>,
}

/// Replace all insights for a user/service pair in a single transaction
/// Returns the number of insights written
pub async fn replace_for_service(
    pool: &SqlitePool,
    user_id: &str,
    service_name: &str,
    insights: &[NewInsight],
) -> Result<usize, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM insights WHERE user_id = ? AND service_name = ?")
        .bind(user_id)
        .bind(service_name)
        .execute(&mut *tx)
        .await?;

    for insight in insights {
        sqlx::query(
            r#"
            INSERT INTO insights (id, user_id, service_name, insight_key, text, severity, confidence, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(cuid2::create_id())
        .bind(user_id)
        .bind(service_name)
        .bind(&insight.insight_key)
        .bind(&insight.text)
        .bind(&insight.severity)
        .bind(insight.confidence)
        .bind(&insight.metadata)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(insights.len())
}

/// List insights for a user/service pair
pub async fn list(
    pool: &SqlitePool,
    user_id: &str,
    service_name: &str,
) -> Result<Vec<InsightRow>, SqliteError> {
    let rows = sqlx::query_as::<_, InsightRow>(
        "SELECT * FROM insights WHERE user_id = ? AND service_name = ? ORDER BY insight_key",
    )
    .bind(user_id)
    .bind(service_name)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    fn make_insight(key: &str, text: &str) -> NewInsight {
        NewInsight {
            insight_key: key.to_string(),
            text: text.to_string(),
            severity: "info".to_string(),
            confidence: 80.0,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let pool = setup_test_pool().await;

        let insights = [
            make_insight("slack:high-activity", "Message volume is high"),
            make_insight("slack:trend-up", "Activity trending up"),
        ];

        replace_for_service(&pool, "u", "slack", &insights)
            .await
            .unwrap();
        replace_for_service(&pool, "u", "slack", &insights)
            .await
            .unwrap();

        let rows = list(&pool, "u", "slack").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_removes_stale_insights() {
        let pool = setup_test_pool().await;

        replace_for_service(
            &pool,
            "u",
            "slack",
            &[make_insight("slack:old", "Old insight")],
        )
        .await
        .unwrap();

        replace_for_service(
            &pool,
            "u",
            "slack",
            &[make_insight("slack:new", "New insight")],
        )
        .await
        .unwrap();

        let rows = list(&pool, "u", "slack").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insight_key, "slack:new");
    }

    #[tokio::test]
    async fn test_replace_does_not_touch_other_services() {
        let pool = setup_test_pool().await;

        replace_for_service(&pool, "u", "slack", &[make_insight("slack:a", "A")])
            .await
            .unwrap();
        replace_for_service(&pool, "u", "github", &[make_insight("github:b", "B")])
            .await
            .unwrap();

        // Clearing slack must leave github intact
        replace_for_service(&pool, "u", "slack", &[]).await.unwrap();

        assert!(list(&pool, "u", "slack").await.unwrap().is_empty());
        assert_eq!(list(&pool, "u", "github").await.unwrap().len(), 1);
    }
}
