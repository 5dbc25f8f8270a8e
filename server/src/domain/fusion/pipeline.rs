//! Per-unit scoring pipeline
//!
//! One pipeline run loads a unit's event window, extracts and normalizes
//! metrics, recalibrates dimension weights, fuses the score, analyzes the
//! trend, and runs anomaly detection. Persistence is separate so a run
//! that fails mid-computation leaves no partial writes.

use std::time::Duration;

use sqlx::SqlitePool;

use crate::core::config::AppConfig;
use crate::data::sqlite::repositories::{events, metrics, score_history};
use crate::data::sqlite::SqliteError;
use crate::data::types::IntegrationRow;
use crate::domain::anomaly::{detect, DetectedAnomaly, DetectorInput};
use crate::domain::insight::{generate, Insight};
use crate::utils::stats::mean;

use super::category::{Dimension, ServiceCategory};
use super::extract::{extract, RawMetricBag};
use super::normalize::{score_dimensions, DimensionScores};
use super::trend::{analyze, TrendSummary};
use super::weighting::{recalibrate, MetricWeight, MetricWeightInput, WeightingOutcome};

const SECS_PER_DAY: i64 = 86_400;

/// Identity of one scoring unit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub user_id: String,
    pub integration_id: String,
}

impl UnitKey {
    pub fn new(user_id: impl Into<String>, integration_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            integration_id: integration_id.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Unit processing timed out after {0:?}")]
    Timeout(Duration),
    #[error("Upstream rate limit: {0}")]
    RateLimited(String),
    #[error("Query failed: {0}")]
    Query(#[from] SqliteError),
    #[error("Processing failed: {0}")]
    Processing(String),
}

/// Everything one successful pipeline run computed, ready to persist
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub category: ServiceCategory,
    pub bag: RawMetricBag,
    pub scores: DimensionScores,
    pub weights: Vec<MetricWeight>,
    pub fusion_score: f64,
    pub trend: TrendSummary,
    pub anomalies: Vec<DetectedAnomaly>,
    pub insights: Vec<Insight>,
}

/// Run the scoring pipeline for one unit.
///
/// Ok(None) means the unit has no events in the window and no prior score
/// history; there is nothing to score and nothing existing to update.
pub async fn run_unit(
    pool: &SqlitePool,
    config: &AppConfig,
    integration: &IntegrationRow,
    now: i64,
) -> Result<Option<UnitOutput>, PipelineError> {
    let user_id = &integration.user_id;
    let integration_id = &integration.integration_id;
    let category = ServiceCategory::parse(&integration.category);

    let window = config.fusion.window_days * SECS_PER_DAY;
    let window_start = now - window;
    let window_events =
        events::list_window(pool, user_id, integration_id, window_start, now).await?;
    let previous_count =
        events::count_between(pool, user_id, integration_id, window_start - window, window_start)
            .await?;

    let score_points =
        score_history::recent(pool, user_id, integration_id, config.fusion.history_limit).await?;
    let score_values: Vec<f64> = score_points.iter().map(|p| p.score).collect();

    if window_events.is_empty() && score_values.is_empty() {
        return Ok(None);
    }

    let bag = extract(category, &window_events);
    let profile = category.profile();
    let scores = score_dimensions(&profile, &bag, &config.fusion);

    // Dimension score histories drive both weighting and the statistical
    // anomaly pass.
    let mut dim_histories: Vec<(Dimension, Vec<f64>)> = Vec::with_capacity(4);
    for dim in Dimension::all() {
        let points = metrics::history(
            pool,
            user_id,
            integration_id,
            dim.as_str(),
            config.fusion.history_limit,
        )
        .await?;
        dim_histories.push((*dim, points.into_iter().map(|p| p.value).collect()));
    }

    let inputs: Vec<MetricWeightInput> = dim_histories
        .iter()
        .map(|(dim, history)| MetricWeightInput {
            name: dim.as_str().to_string(),
            base_weight: profile.base_weights.get(*dim),
            history: history.clone(),
        })
        .collect();
    let weights = match recalibrate(&inputs, &score_values, &config.fusion) {
        WeightingOutcome::Weights(weights) => weights,
        WeightingOutcome::NoData => {
            return Err(PipelineError::Processing(
                "Weighting produced no output for a non-empty dimension set".to_string(),
            ));
        }
    };

    let fusion_score = weights
        .iter()
        .map(|w| {
            let dim = Dimension::all()
                .iter()
                .find(|d| d.as_str() == w.name)
                .copied();
            dim.map_or(0.0, |d| w.final_weight * scores.get(d))
        })
        .sum::<f64>()
        .clamp(0.0, 100.0);

    let trend = analyze(
        window_events.len() as f64,
        previous_count as f64,
        &score_values,
        &config.fusion,
    );

    let latency_history = metrics::history(
        pool,
        user_id,
        integration_id,
        "latency_ms",
        config.fusion.history_limit,
    )
    .await?;
    let error_history = metrics::history(
        pool,
        user_id,
        integration_id,
        "error_rate",
        config.fusion.history_limit,
    )
    .await?;

    let detector_input = DetectorInput {
        latency_ms: bag.system.latency_ms,
        latency_baseline: series_mean(&latency_history),
        error_rate: bag.system.error_rate,
        error_rate_baseline: series_mean(&error_history),
        cpu_percent: bag.system.cpu_percent,
        memory_percent: bag.system.memory_percent,
        metric_series: dim_histories
            .iter()
            .map(|(dim, history)| {
                let mut series = history.clone();
                series.push(scores.get(*dim));
                (dim.as_str().to_string(), series)
            })
            .collect(),
        event_count: bag.event_count,
    };
    let anomalies = detect(&detector_input, &config.anomaly);

    let insights = generate(&integration.service_name, category, &scores, &bag, &trend);

    Ok(Some(UnitOutput {
        user_id: user_id.clone(),
        integration_id: integration_id.clone(),
        service_name: integration.service_name.clone(),
        category,
        bag,
        scores,
        weights,
        fusion_score,
        trend,
        anomalies,
        insights,
    }))
}

fn series_mean(points: &[crate::data::types::MetricHistoryPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    Some(mean(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::{events, integrations, metrics, setup_test_pool};
    use crate::data::sqlite::repositories::events::NewEvent;
    use crate::domain::fusion::trend::TrendDirection;

    const NOW: i64 = 1_700_000_000;

    async fn seed_integration(pool: &SqlitePool, category: &str) -> IntegrationRow {
        integrations::upsert(pool, "u", "slack-1", "slack", category)
            .await
            .unwrap();
        integrations::get(pool, "u", "slack-1").await.unwrap().unwrap()
    }

    fn make_event(occurred_at: i64, metadata: &str) -> NewEvent {
        NewEvent {
            user_id: "u".to_string(),
            integration_id: "slack-1".to_string(),
            service_name: "slack".to_string(),
            event_type: "activity".to_string(),
            occurred_at,
            metadata: Some(metadata.to_string()),
        }
    }

    #[tokio::test]
    async fn test_no_events_no_history_is_none() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "communication").await;

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_scores_unit_from_window_events() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "communication").await;

        events::insert_events(
            &pool,
            &[
                make_event(NOW - 3600, r#"{"message_count": 500, "reply_count": 100}"#),
                make_event(NOW - 7200, r#"{"message_count": 100, "active_channels": 10}"#),
            ],
        )
        .await
        .unwrap();

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(output.category, ServiceCategory::Communication);
        assert_eq!(output.bag.event_count, 2);
        // 600 messages against a 0..1000 scale
        assert!((output.scores.activity - 60.0).abs() < 1e-9);
        assert!(output.fusion_score > 0.0 && output.fusion_score <= 100.0);
        assert_eq!(output.weights.len(), 4);
        let total: f64 = output.weights.iter().map(|w| w.final_weight).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_events_outside_window_ignored() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "communication").await;

        events::insert_events(
            &pool,
            &[
                make_event(NOW - 3600, r#"{"message_count": 10}"#),
                make_event(NOW - 30 * 86_400, r#"{"message_count": 900}"#),
            ],
        )
        .await
        .unwrap();

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.bag.event_count, 1);
        assert_eq!(output.bag.get("message_count"), 10.0);
    }

    #[tokio::test]
    async fn test_previous_window_drives_trend() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "communication").await;

        let mut batch = Vec::new();
        // 2 events last week, 10 this week
        for i in 0..2 {
            batch.push(make_event(NOW - 8 * 86_400 + i, r#"{"message_count": 1}"#));
        }
        for i in 0..10 {
            batch.push(make_event(NOW - 3600 - i, r#"{"message_count": 1}"#));
        }
        events::insert_events(&pool, &batch).await.unwrap();

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.trend.direction, TrendDirection::Up);
        assert!((output.trend.wow_change_pct - 400.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_latency_anomaly_against_recorded_baseline() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "communication").await;

        // Prior runs recorded ~200ms latency
        for (i, value) in [190.0, 200.0, 210.0].iter().enumerate() {
            metrics::append_history(&pool, "u", "slack-1", "latency_ms", *value, NOW - 86_400 + i as i64)
                .await
                .unwrap();
        }
        events::insert_events(
            &pool,
            &[make_event(NOW - 3600, r#"{"message_count": 5, "latency_ms": 2500}"#)],
        )
        .await
        .unwrap();

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap()
            .unwrap();
        let latency = output
            .anomalies
            .iter()
            .find(|a| a.anomaly_type == "latency_spike")
            .unwrap();
        assert_eq!(latency.observed, 2500.0);
        assert!((latency.baseline - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back_to_general() {
        let pool = setup_test_pool().await;
        let integration = seed_integration(&pool, "not-a-category").await;

        events::insert_events(&pool, &[make_event(NOW - 3600, r#"{"event_count": 5}"#)])
            .await
            .unwrap();

        let output = run_unit(&pool, &AppConfig::default(), &integration, NOW)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.category, ServiceCategory::General);
    }
}
