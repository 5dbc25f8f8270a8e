//! SQLite schema definitions
//!
//! Initial schema with all tables. No migrations needed for first version.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Integrations (scoring units, one per user/integration pair)
-- =============================================================================
CREATE TABLE IF NOT EXISTS integrations (
    user_id TEXT NOT NULL CHECK(length(user_id) >= 1),
    integration_id TEXT NOT NULL CHECK(length(integration_id) >= 1),
    service_name TEXT NOT NULL CHECK(length(service_name) >= 1),
    category TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, integration_id)
);

CREATE INDEX IF NOT EXISTS idx_integrations_enabled ON integrations(enabled, user_id);

-- =============================================================================
-- 2. Raw Events (append-only ingestion log)
-- =============================================================================
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    event_type TEXT NOT NULL,
    occurred_at INTEGER NOT NULL,
    metadata TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_unit_time
    ON events(user_id, integration_id, occurred_at);

-- =============================================================================
-- 3. Normalized Metrics (latest per-metric scoring state)
-- =============================================================================
CREATE TABLE IF NOT EXISTS normalized_metrics (
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    raw_value REAL NOT NULL,
    normalized_value REAL NOT NULL CHECK(normalized_value >= 0 AND normalized_value <= 100),
    metric_type TEXT NOT NULL CHECK(metric_type IN ('count', 'average', 'percentage', 'trend')),
    weight REAL NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, integration_id, metric_name)
);

-- =============================================================================
-- 4. Metric History (append-only time series)
-- =============================================================================
CREATE TABLE IF NOT EXISTS metric_history (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    value REAL NOT NULL,
    recorded_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metric_history_series
    ON metric_history(user_id, integration_id, metric_name, recorded_at);

-- =============================================================================
-- 5. Weightings (latest adaptive weight per metric)
-- =============================================================================
CREATE TABLE IF NOT EXISTS weightings (
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    base_weight REAL NOT NULL,
    final_weight REAL NOT NULL CHECK(final_weight >= 0),
    variance REAL NOT NULL,
    confidence REAL NOT NULL,
    adjustment_reason TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, integration_id, metric_name)
);

-- =============================================================================
-- 6. Score History (append-only fusion score series)
-- =============================================================================
CREATE TABLE IF NOT EXISTS score_history (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    score REAL NOT NULL,
    recorded_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_score_history_unit
    ON score_history(user_id, integration_id, recorded_at);

-- =============================================================================
-- 7. Insights (replaced wholesale per user/service on each run)
-- =============================================================================
CREATE TABLE IF NOT EXISTS insights (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    insight_key TEXT NOT NULL,
    text TEXT NOT NULL,
    severity TEXT NOT NULL CHECK(severity IN ('info', 'warning', 'positive', 'negative')),
    confidence REAL NOT NULL CHECK(confidence >= 0 AND confidence <= 100),
    metadata TEXT,
    created_at INTEGER NOT NULL,
    UNIQUE(user_id, service_name, insight_key)
);

CREATE INDEX IF NOT EXISTS idx_insights_service ON insights(user_id, service_name);

-- =============================================================================
-- 8. Anomalies (append-only detection log)
-- =============================================================================
CREATE TABLE IF NOT EXISTS anomalies (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    anomaly_type TEXT NOT NULL,
    category TEXT NOT NULL,
    severity TEXT NOT NULL CHECK(severity IN ('low', 'medium', 'high', 'critical')),
    confidence REAL NOT NULL CHECK(confidence >= 0 AND confidence <= 95),
    baseline REAL NOT NULL,
    observed REAL NOT NULL,
    deviation_pct REAL NOT NULL,
    detection_method TEXT NOT NULL,
    recommended_actions TEXT NOT NULL,
    explanation TEXT,
    detected_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_anomalies_user_time ON anomalies(user_id, detected_at);

-- =============================================================================
-- 9. Snapshots (one row per scoring unit, failure-isolated)
-- =============================================================================
CREATE TABLE IF NOT EXISTS snapshots (
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    category TEXT NOT NULL,
    activity REAL NOT NULL DEFAULT 0,
    participation REAL NOT NULL DEFAULT 0,
    responsiveness REAL NOT NULL DEFAULT 0,
    throughput REAL NOT NULL DEFAULT 0,
    fusion_score REAL NOT NULL DEFAULT 0,
    trend_direction TEXT NOT NULL DEFAULT 'stable' CHECK(trend_direction IN ('up', 'down', 'stable')),
    anomaly_detected INTEGER NOT NULL DEFAULT 0,
    fusion_contribution REAL NOT NULL DEFAULT 0,
    last_successful_run_at INTEGER,
    last_failed_run_at INTEGER,
    failure_reason TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, integration_id)
);

CREATE INDEX IF NOT EXISTS idx_snapshots_user ON snapshots(user_id);

-- =============================================================================
-- 10. Recalibration Audit (append-only, one row per processed unit)
-- =============================================================================
CREATE TABLE IF NOT EXISTS recalibration_audit (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    integration_id TEXT NOT NULL,
    trigger_type TEXT NOT NULL CHECK(trigger_type IN ('manual_recalibration', 'scheduled_recalibration')),
    status TEXT NOT NULL CHECK(status IN ('success', 'failed', 'skipped', 'no_data')),
    failure_kind TEXT,
    detail TEXT,
    duration_ms INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recalibration_audit_unit
    ON recalibration_audit(user_id, integration_id, created_at);
"#;
