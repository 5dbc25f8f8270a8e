//! Shared data row types
//!
//! Plain structs mapped from SQLite rows via sqlx::FromRow. Timestamps are
//! unix seconds throughout.

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Raw integration event as ingested
#[derive(Debug, Clone, FromRow)]
pub struct RawEvent {
    pub id: String,
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub event_type: String,
    pub occurred_at: i64,
    /// JSON object of metric fields, stored as TEXT
    pub metadata: Option<String>,
    pub created_at: i64,
}

/// Registered scoring unit (one per user/integration pair)
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct IntegrationRow {
    pub user_id: String,
    pub integration_id: String,
    pub service_name: String,
    pub category: String,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Latest normalized state of one metric
#[derive(Debug, Clone, FromRow)]
pub struct NormalizedMetricRow {
    pub user_id: String,
    pub integration_id: String,
    pub metric_name: String,
    pub raw_value: f64,
    pub normalized_value: f64,
    pub metric_type: String,
    pub weight: f64,
    pub updated_at: i64,
}

/// One point of a metric time series
#[derive(Debug, Clone, FromRow)]
pub struct MetricHistoryPoint {
    pub value: f64,
    pub recorded_at: i64,
}

/// Latest adaptive weight for one metric
#[derive(Debug, Clone, FromRow)]
pub struct WeightingRow {
    pub user_id: String,
    pub integration_id: String,
    pub metric_name: String,
    pub base_weight: f64,
    pub final_weight: f64,
    pub variance: f64,
    pub confidence: f64,
    pub adjustment_reason: String,
    pub updated_at: i64,
}

/// One point of the fusion score series
#[derive(Debug, Clone, FromRow)]
pub struct ScoreHistoryPoint {
    pub score: f64,
    pub recorded_at: i64,
}

/// Stored insight for a user/service pair
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct InsightRow {
    pub id: String,
    pub user_id: String,
    pub service_name: String,
    pub insight_key: String,
    pub text: String,
    pub severity: String,
    pub confidence: f64,
    pub metadata: Option<String>,
    pub created_at: i64,
}

/// Stored anomaly detection result
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct AnomalyRow {
    pub id: String,
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
    pub detected_at: i64,
}

/// Per-unit snapshot of the latest scoring state
///
/// Failure isolation invariant: a failed run only touches
/// `last_failed_run_at`, `failure_reason`, and `updated_at`. All scoring
/// fields keep the values from the last successful run.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SnapshotRow {
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
    pub fusion_contribution: f64,
    pub last_successful_run_at: Option<i64>,
    pub last_failed_run_at: Option<i64>,
    pub failure_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Audit row recorded for every processed unit
#[derive(Debug, Clone, FromRow)]
pub struct AuditRow {
    pub id: String,
    pub user_id: String,
    pub integration_id: String,
    pub trigger_type: String,
    pub status: String,
    pub failure_kind: Option<String>,
    pub detail: Option<String>,
    pub duration_ms: i64,
    pub created_at: i64,
}
