//! Pipeline output persistence
//!
//! Writes everything a successful run computed: normalized metrics,
//! history points, weights, insights, anomalies, and the snapshot.
//! Anomaly explanation happens here so a slow or broken explainer can
//! only delay persistence, never fail it.

use sqlx::SqlitePool;

use crate::core::config::AppConfig;
use crate::data::sqlite::repositories::{
    anomalies, insights, metrics, score_history, snapshots, weightings,
};
use crate::data::sqlite::SqliteError;
use crate::domain::anomaly::{explain_or_fallback, Explainer};

use super::category::Dimension;
use super::pipeline::UnitOutput;

/// Persist one successful pipeline run.
///
/// Returns the number of insights written.
pub async fn persist_success(
    pool: &SqlitePool,
    output: &UnitOutput,
    explainer: &dyn Explainer,
    config: &AppConfig,
    now: i64,
) -> Result<usize, SqliteError> {
    let user_id = &output.user_id;
    let integration_id = &output.integration_id;
    let profile = output.category.profile();

    for dim in Dimension::all() {
        let rule = profile.rule(*dim);
        let raw_value = rule
            .source_metric()
            .map_or(0.0, |metric| output.bag.get(metric));
        let weight = output
            .weights
            .iter()
            .find(|w| w.name == dim.as_str())
            .map_or(0.0, |w| w.final_weight);

        metrics::upsert_metric(
            pool,
            user_id,
            integration_id,
            dim.as_str(),
            raw_value,
            output.scores.get(*dim),
            rule.metric_type().as_str(),
            weight,
        )
        .await?;
        metrics::append_history(
            pool,
            user_id,
            integration_id,
            dim.as_str(),
            output.scores.get(*dim),
            now,
        )
        .await?;
    }

    // System signals get their own history so future runs have baselines
    for (name, value) in [
        ("latency_ms", output.bag.system.latency_ms),
        ("error_rate", output.bag.system.error_rate),
        ("cpu_percent", output.bag.system.cpu_percent),
        ("memory_percent", output.bag.system.memory_percent),
    ] {
        if let Some(value) = value {
            metrics::append_history(pool, user_id, integration_id, name, value, now).await?;
        }
    }

    score_history::append(pool, user_id, integration_id, output.fusion_score, now).await?;

    let weight_updates: Vec<weightings::WeightUpdate> = output
        .weights
        .iter()
        .map(|w| weightings::WeightUpdate {
            metric_name: w.name.clone(),
            base_weight: w.base_weight,
            final_weight: w.final_weight,
            variance: w.variance,
            confidence: w.confidence,
            adjustment_reason: w.adjustment_reason.to_string(),
        })
        .collect();
    weightings::upsert_all(pool, user_id, integration_id, &weight_updates).await?;

    let new_insights: Vec<insights::NewInsight> = output
        .insights
        .iter()
        .map(|i| insights::NewInsight {
            insight_key: i.key.clone(),
            text: i.text.clone(),
            severity: i.severity.as_str().to_string(),
            confidence: i.confidence,
            metadata: i.metadata.clone(),
        })
        .collect();
    let written =
        insights::replace_for_service(pool, user_id, &output.service_name, &new_insights).await?;

    // Anomalies are already sorted worst first; only the top few get an
    // explanation.
    let mut new_anomalies = Vec::with_capacity(output.anomalies.len());
    for (index, anomaly) in output.anomalies.iter().enumerate() {
        let explanation = if index < config.anomaly.max_explained {
            Some(explain_or_fallback(explainer, &output.service_name, anomaly).await)
        } else {
            None
        };
        new_anomalies.push(anomalies::NewAnomaly {
            user_id: user_id.clone(),
            integration_id: integration_id.clone(),
            service_name: output.service_name.clone(),
            anomaly_type: anomaly.anomaly_type.clone(),
            category: anomaly.category.to_string(),
            severity: anomaly.severity.as_str().to_string(),
            confidence: anomaly.confidence,
            baseline: anomaly.baseline,
            observed: anomaly.observed,
            deviation_pct: anomaly.deviation_pct,
            detection_method: anomaly.detection_method.to_string(),
            recommended_actions: serde_json::to_string(&anomaly.recommended_actions)
                .unwrap_or_else(|_| "[]".to_string()),
            explanation,
        });
    }
    anomalies::insert_all(pool, &new_anomalies).await?;

    snapshots::upsert_success(
        pool,
        &snapshots::SnapshotUpdate {
            user_id: user_id.clone(),
            integration_id: integration_id.clone(),
            service_name: output.service_name.clone(),
            category: output.category.as_str().to_string(),
            activity: output.scores.activity,
            participation: output.scores.participation,
            responsiveness: output.scores.responsiveness,
            throughput: output.scores.throughput,
            fusion_score: output.fusion_score,
            trend_direction: output.trend.direction.as_str().to_string(),
            anomaly_detected: !output.anomalies.is_empty(),
        },
        now,
    )
    .await?;
    snapshots::recompute_contributions(pool, user_id).await?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::{events, integrations, setup_test_pool};
    use crate::data::sqlite::repositories::events::NewEvent;
    use crate::domain::anomaly::explain::TemplateExplainer;
    use crate::domain::fusion::pipeline::run_unit;

    const NOW: i64 = 1_700_000_000;

    async fn run_and_persist(pool: &SqlitePool, metadata: &str) -> UnitOutput {
        integrations::upsert(pool, "u", "slack-1", "slack", "communication")
            .await
            .unwrap();
        let integration = integrations::get(pool, "u", "slack-1")
            .await
            .unwrap()
            .unwrap();
        events::insert_events(
            pool,
            &[NewEvent {
                user_id: "u".to_string(),
                integration_id: "slack-1".to_string(),
                service_name: "slack".to_string(),
                event_type: "activity".to_string(),
                occurred_at: NOW - 3600,
                metadata: Some(metadata.to_string()),
            }],
        )
        .await
        .unwrap();

        let config = AppConfig::default();
        let output = run_unit(pool, &config, &integration, NOW)
            .await
            .unwrap()
            .unwrap();
        persist_success(pool, &output, &TemplateExplainer, &config, NOW)
            .await
            .unwrap();
        output
    }

    #[tokio::test]
    async fn test_persists_metrics_weights_and_snapshot() {
        let pool = setup_test_pool().await;
        let output = run_and_persist(&pool, r#"{"message_count": 500, "reply_count": 100}"#).await;

        let rows = metrics::list_for_unit(&pool, "u", "slack-1").await.unwrap();
        assert_eq!(rows.len(), 4);
        let activity = rows.iter().find(|r| r.metric_name == "activity").unwrap();
        assert_eq!(activity.raw_value, 500.0);
        assert_eq!(activity.normalized_value, output.scores.activity);

        let weights = weightings::list_for_unit(&pool, "u", "slack-1").await.unwrap();
        assert_eq!(weights.len(), 4);

        let snapshot = snapshots::get(&pool, "u", "slack-1").await.unwrap().unwrap();
        assert_eq!(snapshot.fusion_score, output.fusion_score);
        assert_eq!(snapshot.last_successful_run_at, Some(NOW));
        assert!((snapshot.fusion_contribution - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_score_and_dimension_histories_appended() {
        let pool = setup_test_pool().await;
        let output = run_and_persist(&pool, r#"{"message_count": 500}"#).await;

        let scores = score_history::recent(&pool, "u", "slack-1", 10).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, output.fusion_score);

        let history = metrics::history(&pool, "u", "slack-1", "activity", 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, output.scores.activity);
    }

    #[tokio::test]
    async fn test_anomalies_persisted_with_explanations() {
        let pool = setup_test_pool().await;
        // Prior baseline of ~200ms so the 2500ms observation is a spike
        for (i, value) in [190.0, 200.0, 210.0].iter().enumerate() {
            metrics::append_history(&pool, "u", "slack-1", "latency_ms", *value, NOW - 86_400 + i as i64)
                .await
                .unwrap();
        }
        run_and_persist(&pool, r#"{"message_count": 50, "latency_ms": 2500}"#).await;

        let rows = anomalies::list_recent(&pool, "u", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].anomaly_type, "latency_spike");
        assert!(rows[0].explanation.as_deref().unwrap().contains("slack"));

        let snapshot = snapshots::get(&pool, "u", "slack-1").await.unwrap().unwrap();
        assert!(snapshot.anomaly_detected);
    }

    #[tokio::test]
    async fn test_system_signal_history_recorded_for_baselines() {
        let pool = setup_test_pool().await;
        run_and_persist(&pool, r#"{"message_count": 50, "latency_ms": 180}"#).await;

        let latency = metrics::history(&pool, "u", "slack-1", "latency_ms", 10)
            .await
            .unwrap();
        assert_eq!(latency.len(), 1);
        assert_eq!(latency[0].value, 180.0);

        // Absent signals leave no history
        let cpu = metrics::history(&pool, "u", "slack-1", "cpu_percent", 10)
            .await
            .unwrap();
        assert!(cpu.is_empty());
    }
}
