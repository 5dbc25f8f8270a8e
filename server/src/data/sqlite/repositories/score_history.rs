//! Fusion score history repository

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::ScoreHistoryPoint;

/// Append one fusion score point
pub async fn append(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    score: f64,
    recorded_at: i64,
) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO score_history (id, user_id, integration_id, score, recorded_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(cuid2::create_id())
    .bind(user_id)
    .bind(integration_id)
    .bind(score)
    .bind(recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the most recent `limit` score points, oldest first
pub async fn recent(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    limit: u32,
) -> Result<Vec<ScoreHistoryPoint>, SqliteError> {
    let mut rows = sqlx::query_as::<_, ScoreHistoryPoint>(
        r#"
        SELECT score, recorded_at
        FROM score_history
        WHERE user_id = ? AND integration_id = ?
        ORDER BY recorded_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
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
    async fn test_append_and_recent_order() {
        let pool = setup_test_pool().await;

        append(&pool, "u", "i", 50.0, 100).await.unwrap();
        append(&pool, "u", "i", 60.0, 200).await.unwrap();
        append(&pool, "u", "i", 70.0, 300).await.unwrap();

        let points = recent(&pool, "u", "i", 2).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].score, 60.0);
        assert_eq!(points[1].score, 70.0);
    }

    #[tokio::test]
    async fn test_recent_scopes_to_unit() {
        let pool = setup_test_pool().await;

        append(&pool, "u", "i", 50.0, 100).await.unwrap();
        append(&pool, "u", "other", 99.0, 100).await.unwrap();

        let points = recent(&pool, "u", "i", 10).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].score, 50.0);
    }
}
