//! Snapshot repository
//!
//! One row per scoring unit. Successful runs overwrite the scoring fields;
//! failed runs touch ONLY the failure-tracking fields so the last good
//! scores stay visible.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::SnapshotRow;

/// Scoring fields written on a successful run
#[derive(Debug, Clone)]
pub struct SnapshotUpdate {
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub category: String,
    pub activity: f64,
    pub participation: f64,
    pub responsiveness: f64,
    pub throughput: f64,
    pub fusion_score: f64,
    pub trend_direction: String,
    pub anomaly_detected: bool,
}

/// Record a successful run
///
/// Overwrites all scoring fields, stamps last_successful_run_at, and clears
/// failure_reason. last_failed_run_at is preserved as history.
pub async fn upsert_success(
    pool: &SqlitePool,
    update: &SnapshotUpdate,
    now: i64,
) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO snapshots (user_id, integration_id, service_name, category, activity, participation, responsiveness, throughput, fusion_score, trend_direction, anomaly_detected, fusion_contribution, last_successful_run_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
        ON CONFLICT (user_id, integration_id) DO UPDATE SET
            service_name = excluded.service_name,
            category = excluded.category,
            activity = excluded.activity,
            participation = excluded.participation,
            responsiveness = excluded.responsiveness,
            throughput = excluded.throughput,
            fusion_score = excluded.fusion_score,
            trend_direction = excluded.trend_direction,
            anomaly_detected = excluded.anomaly_detected,
            last_successful_run_at = excluded.last_successful_run_at,
            failure_reason = NULL,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&update.user_id)
    .bind(&update.integration_id)
    .bind(&update.service_name)
    .bind(&update.category)
    .bind(update.activity)
    .bind(update.participation)
    .bind(update.responsiveness)
    .bind(update.throughput)
    .bind(update.fusion_score)
    .bind(&update.trend_direction)
    .bind(update.anomaly_detected)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a failed run
///
/// Touches ONLY last_failed_run_at, failure_reason, and updated_at on an
/// existing row. Creates a zeroed row for units that never succeeded.
pub async fn mark_failed(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
    service_name: &str,
    category: &str,
    failure_reason: &str,
    now: i64,
) -> Result<(), SqliteError> {
    sqlx::query(
        r#"
        INSERT INTO snapshots (user_id, integration_id, service_name, category, last_failed_run_at, failure_reason, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, integration_id) DO UPDATE SET
            last_failed_run_at = excluded.last_failed_run_at,
            failure_reason = excluded.failure_reason,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(integration_id)
    .bind(service_name)
    .bind(category)
    .bind(now)
    .bind(failure_reason)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a single snapshot
pub async fn get(
    pool: &SqlitePool,
    user_id: &str,
    integration_id: &str,
) -> Result<Option<SnapshotRow>, SqliteError> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT * FROM snapshots WHERE user_id = ? AND integration_id = ?",
    )
    .bind(user_id)
    .bind(integration_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List all snapshots for a user
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<SnapshotRow>, SqliteError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(
        "SELECT * FROM snapshots WHERE user_id = ? ORDER BY integration_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Recompute each snapshot's share of the user's total fusion score
///
/// Contribution is the unit's percentage of the sum across all of the
/// user's snapshots; 0 everywhere when the total is not positive.
pub async fn recompute_contributions(pool: &SqlitePool, user_id: &str) -> Result<(), SqliteError> {
    let (total,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(fusion_score), 0) FROM snapshots WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if total > 0.0 {
        sqlx::query(
            "UPDATE snapshots SET fusion_contribution = fusion_score / ? * 100.0 WHERE user_id = ?",
        )
        .bind(total)
        .bind(user_id)
        .execute(pool)
        .await?;
    } else {
        sqlx::query("UPDATE snapshots SET fusion_contribution = 0 WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::setup_test_pool;

    fn make_update(fusion_score: f64) -> SnapshotUpdate {
        SnapshotUpdate {
            user_id: "u".to_string(),
            integration_id: "slack-1".to_string(),
            service_name: "slack".to_string(),
            category: "communication".to_string(),
            activity: 80.0,
            participation: 60.0,
            responsiveness: 70.0,
            throughput: 50.0,
            fusion_score,
            trend_direction: "up".to_string(),
            anomaly_detected: false,
        }
    }

    #[tokio::test]
    async fn test_upsert_success_writes_scores() {
        let pool = setup_test_pool().await;

        upsert_success(&pool, &make_update(65.0), 1000).await.unwrap();

        let snap = get(&pool, "u", "slack-1").await.unwrap().unwrap();
        assert_eq!(snap.fusion_score, 65.0);
        assert_eq!(snap.trend_direction, "up");
        assert_eq!(snap.last_successful_run_at, Some(1000));
        assert!(snap.failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_failure_preserves_last_good_scores() {
        let pool = setup_test_pool().await;

        upsert_success(&pool, &make_update(65.0), 1000).await.unwrap();
        let before = get(&pool, "u", "slack-1").await.unwrap().unwrap();

        mark_failed(
            &pool,
            "u",
            "slack-1",
            "slack",
            "communication",
            "timeout after 8s",
            2000,
        )
        .await
        .unwrap();

        let after = get(&pool, "u", "slack-1").await.unwrap().unwrap();

        // Scoring fields are byte-identical to the last successful run
        assert_eq!(after.activity, before.activity);
        assert_eq!(after.participation, before.participation);
        assert_eq!(after.responsiveness, before.responsiveness);
        assert_eq!(after.throughput, before.throughput);
        assert_eq!(after.fusion_score, before.fusion_score);
        assert_eq!(after.trend_direction, before.trend_direction);
        assert_eq!(after.anomaly_detected, before.anomaly_detected);
        assert_eq!(after.last_successful_run_at, before.last_successful_run_at);

        // Only failure tracking changed
        assert_eq!(after.last_failed_run_at, Some(2000));
        assert_eq!(after.failure_reason.as_deref(), Some("timeout after 8s"));
    }

    #[tokio::test]
    async fn test_success_clears_failure_reason_keeps_failed_at() {
        let pool = setup_test_pool().await;

        mark_failed(&pool, "u", "slack-1", "slack", "communication", "rate limited", 1000)
            .await
            .unwrap();
        upsert_success(&pool, &make_update(70.0), 2000).await.unwrap();

        let snap = get(&pool, "u", "slack-1").await.unwrap().unwrap();
        assert!(snap.failure_reason.is_none());
        assert_eq!(snap.last_failed_run_at, Some(1000));
        assert_eq!(snap.last_successful_run_at, Some(2000));
    }

    #[tokio::test]
    async fn test_failure_on_fresh_unit_creates_zeroed_row() {
        let pool = setup_test_pool().await;

        mark_failed(&pool, "u", "new-1", "notion", "documentation", "query error", 1000)
            .await
            .unwrap();

        let snap = get(&pool, "u", "new-1").await.unwrap().unwrap();
        assert_eq!(snap.fusion_score, 0.0);
        assert!(snap.last_successful_run_at.is_none());
        assert_eq!(snap.last_failed_run_at, Some(1000));
    }

    #[tokio::test]
    async fn test_recompute_contributions() {
        let pool = setup_test_pool().await;

        let mut a = make_update(75.0);
        a.integration_id = "a".to_string();
        let mut b = make_update(25.0);
        b.integration_id = "b".to_string();
        upsert_success(&pool, &a, 1000).await.unwrap();
        upsert_success(&pool, &b, 1000).await.unwrap();

        recompute_contributions(&pool, "u").await.unwrap();

        let snap_a = get(&pool, "u", "a").await.unwrap().unwrap();
        let snap_b = get(&pool, "u", "b").await.unwrap().unwrap();
        assert!((snap_a.fusion_contribution - 75.0).abs() < 1e-9);
        assert!((snap_b.fusion_contribution - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_recompute_contributions_zero_total() {
        let pool = setup_test_pool().await;

        mark_failed(&pool, "u", "a", "slack", "communication", "timeout", 1000)
            .await
            .unwrap();
        recompute_contributions(&pool, "u").await.unwrap();

        let snap = get(&pool, "u", "a").await.unwrap().unwrap();
        assert_eq!(snap.fusion_contribution, 0.0);
    }
}
