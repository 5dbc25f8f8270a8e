//! Batch orchestration
//!
//! Runs the scoring pipeline across every enabled unit with bounded
//! concurrency, a per-unit timeout, and full failure isolation: one
//! unit's failure is recorded against that unit and never stops the
//! batch. A DashMap of in-flight units prevents concurrent runs of the
//! same unit from overlapping writes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::core::config::AppConfig;
use crate::data::sqlite::repositories::{anomalies, audit, integrations, snapshots};
use crate::data::sqlite::SqliteService;
use crate::data::types::IntegrationRow;
use crate::domain::anomaly::{explain_or_fallback, DetectedAnomaly, Explainer, Severity};
use crate::utils::time::now_secs;

use super::persist::persist_success;
use super::pipeline::{run_unit, PipelineError, UnitKey};

/// Failure taxonomy recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    RateLimit,
    QueryError,
    ProcessingError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::QueryError => "query_error",
            Self::ProcessingError => "processing_error",
        }
    }

    pub fn classify(error: &PipelineError) -> Self {
        match error {
            PipelineError::Timeout(_) => Self::Timeout,
            PipelineError::RateLimited(_) => Self::RateLimit,
            PipelineError::Query(_) => Self::QueryError,
            PipelineError::Processing(_) => Self::ProcessingError,
        }
    }
}

/// What started a batch or unit run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Manual,
    Scheduled,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual_recalibration",
            Self::Scheduled => "scheduled_recalibration",
        }
    }
}

/// Optional narrowing of a batch run to one user or one unit
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub user_id: Option<String>,
    pub integration_id: Option<String>,
}

impl RunFilter {
    fn matches(&self, row: &IntegrationRow) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == row.user_id)
            && self
                .integration_id
                .as_deref()
                .is_none_or(|i| i == row.integration_id)
    }
}

/// Aggregated outcome of one batch run
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RunSummary {
    /// True when the batch itself ran to completion. Individual unit
    /// failures land in `failed` and `errors`, not here.
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub insights_generated: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub errors: Vec<String>,
}

/// Outcome of an on-demand anomaly scan
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ScanOutcome {
    pub anomalies_found: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub anomaly_ids: Vec<String>,
}

enum UnitOutcome {
    Success {
        insights: usize,
        critical: usize,
        high: usize,
    },
    NoData,
    Skipped,
    Failed {
        kind: FailureKind,
        message: String,
    },
}

fn severity_counts(anomalies: &[DetectedAnomaly]) -> (usize, usize) {
    let critical = anomalies
        .iter()
        .filter(|a| a.severity == Severity::Critical)
        .count();
    let high = anomalies
        .iter()
        .filter(|a| a.severity == Severity::High)
        .count();
    (critical, high)
}

pub struct Orchestrator {
    database: Arc<SqliteService>,
    config: Arc<AppConfig>,
    explainer: Arc<dyn Explainer>,
    active: DashMap<UnitKey, ()>,
}

impl Orchestrator {
    pub fn new(
        database: Arc<SqliteService>,
        config: Arc<AppConfig>,
        explainer: Arc<dyn Explainer>,
    ) -> Self {
        Self {
            database,
            config,
            explainer,
            active: DashMap::new(),
        }
    }

    /// Run the pipeline for every enabled unit.
    pub async fn run_batch(&self, trigger: RunTrigger) -> RunSummary {
        self.run_batch_filtered(trigger, &RunFilter::default()).await
    }

    /// Run the pipeline for the enabled units matching `filter`.
    pub async fn run_batch_filtered(&self, trigger: RunTrigger, filter: &RunFilter) -> RunSummary {
        let units = match integrations::list_enabled(self.database.pool()).await {
            Ok(units) => units,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list enabled integrations");
                return RunSummary {
                    success: false,
                    errors: vec![format!("Failed to list integrations: {e}")],
                    ..Default::default()
                };
            }
        };

        let units: Vec<IntegrationRow> =
            units.into_iter().filter(|u| filter.matches(u)).collect();

        tracing::info!(
            units = units.len(),
            trigger = trigger.as_str(),
            "Starting batch run"
        );
        let started = Instant::now();
        let now = now_secs();

        let outcomes: Vec<(IntegrationRow, UnitOutcome)> = stream::iter(units)
            .map(|integration| async move {
                let outcome = self.run_one(&integration, trigger, now).await;
                (integration, outcome)
            })
            .buffer_unordered(self.config.orchestrator.max_concurrency)
            .collect()
            .await;

        let mut summary = RunSummary {
            success: true,
            ..Default::default()
        };
        for (integration, outcome) in outcomes {
            match outcome {
                UnitOutcome::Success {
                    insights,
                    critical,
                    high,
                } => {
                    summary.processed += 1;
                    summary.insights_generated += insights;
                    summary.critical_count += critical;
                    summary.high_count += high;
                }
                UnitOutcome::NoData => {
                    summary.processed += 1;
                }
                UnitOutcome::Skipped => {
                    summary.skipped += 1;
                }
                UnitOutcome::Failed { kind, message } => {
                    summary.failed += 1;
                    summary.errors.push(format!(
                        "{} ({}): [{}] {}",
                        integration.service_name,
                        integration.integration_id,
                        kind.as_str(),
                        message
                    ));
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch run finished"
        );
        summary
    }

    /// Run the pipeline for a single unit on demand.
    pub async fn recalibrate(
        &self,
        user_id: &str,
        integration_id: &str,
        trigger: RunTrigger,
    ) -> Result<RunSummary, PipelineError> {
        let integration = integrations::get(self.database.pool(), user_id, integration_id)
            .await
            .map_err(PipelineError::Query)?
            .ok_or_else(|| {
                PipelineError::Processing(format!("Unknown integration: {integration_id}"))
            })?;

        let outcome = self.run_one(&integration, trigger, now_secs()).await;
        let mut summary = RunSummary {
            success: true,
            ..Default::default()
        };
        match outcome {
            UnitOutcome::Success {
                insights,
                critical,
                high,
            } => {
                summary.processed = 1;
                summary.insights_generated = insights;
                summary.critical_count = critical;
                summary.high_count = high;
            }
            UnitOutcome::NoData => summary.processed = 1,
            UnitOutcome::Skipped => summary.skipped = 1,
            UnitOutcome::Failed { kind, message } => {
                summary.failed = 1;
                summary
                    .errors
                    .push(format!("[{}] {}", kind.as_str(), message));
            }
        }
        Ok(summary)
    }

    /// Detection-only pass for one unit; persists anomalies but leaves
    /// scores, insights, and the snapshot untouched.
    pub async fn scan_anomalies(
        &self,
        user_id: &str,
        integration_id: &str,
    ) -> Result<ScanOutcome, PipelineError> {
        let pool = self.database.pool();
        let integration = integrations::get(pool, user_id, integration_id)
            .await
            .map_err(PipelineError::Query)?
            .ok_or_else(|| {
                PipelineError::Processing(format!("Unknown integration: {integration_id}"))
            })?;

        let Some(output) = run_unit(pool, &self.config, &integration, now_secs()).await? else {
            return Ok(ScanOutcome::default());
        };

        let mut records = Vec::with_capacity(output.anomalies.len());
        for (index, anomaly) in output.anomalies.iter().enumerate() {
            let explanation = if index < self.config.anomaly.max_explained {
                Some(
                    explain_or_fallback(self.explainer.as_ref(), &output.service_name, anomaly)
                        .await,
                )
            } else {
                None
            };
            records.push(anomalies::NewAnomaly {
                user_id: output.user_id.clone(),
                integration_id: output.integration_id.clone(),
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
        let ids = anomalies::insert_all(pool, &records)
            .await
            .map_err(PipelineError::Query)?;

        let (critical, high) = severity_counts(&output.anomalies);
        Ok(ScanOutcome {
            anomalies_found: ids.len(),
            critical_count: critical,
            high_count: high,
            anomaly_ids: ids,
        })
    }

    async fn run_one(
        &self,
        integration: &IntegrationRow,
        trigger: RunTrigger,
        now: i64,
    ) -> UnitOutcome {
        let key = UnitKey::new(&integration.user_id, &integration.integration_id);
        if self.active.insert(key.clone(), ()).is_some() {
            tracing::debug!(
                user = %integration.user_id,
                integration = %integration.integration_id,
                "Unit already in flight, skipping"
            );
            self.record_audit(integration, trigger, "skipped", None, None, 0)
                .await;
            return UnitOutcome::Skipped;
        }
        let _guard = UnitGuard {
            active: &self.active,
            key,
        };

        let pool = self.database.pool();
        let timeout = Duration::from_secs(self.config.orchestrator.unit_timeout_secs);
        let started = Instant::now();

        let result = tokio::time::timeout(timeout, async {
            match run_unit(pool, &self.config, integration, now).await? {
                Some(output) => {
                    let (critical, high) = severity_counts(&output.anomalies);
                    let insights = persist_success(
                        pool,
                        &output,
                        self.explainer.as_ref(),
                        &self.config,
                        now,
                    )
                    .await?;
                    Ok::<_, PipelineError>(Some((insights, critical, high)))
                }
                None => Ok(None),
            }
        })
        .await
        .unwrap_or(Err(PipelineError::Timeout(timeout)));

        let duration_ms = started.elapsed().as_millis() as i64;
        match result {
            Ok(Some((insights, critical, high))) => {
                self.record_audit(integration, trigger, "success", None, None, duration_ms)
                    .await;
                UnitOutcome::Success {
                    insights,
                    critical,
                    high,
                }
            }
            Ok(None) => {
                self.record_audit(integration, trigger, "no_data", None, None, duration_ms)
                    .await;
                UnitOutcome::NoData
            }
            Err(error) => {
                let kind = FailureKind::classify(&error);
                let message = error.to_string();
                tracing::warn!(
                    user = %integration.user_id,
                    integration = %integration.integration_id,
                    kind = kind.as_str(),
                    error = %message,
                    "Unit run failed"
                );

                if let Err(e) = snapshots::mark_failed(
                    pool,
                    &integration.user_id,
                    &integration.integration_id,
                    &integration.service_name,
                    &integration.category,
                    &message,
                    now,
                )
                .await
                {
                    tracing::error!(error = %e, "Failed to record unit failure on snapshot");
                }
                self.record_audit(
                    integration,
                    trigger,
                    "failed",
                    Some(kind.as_str()),
                    Some(&message),
                    duration_ms,
                )
                .await;
                UnitOutcome::Failed { kind, message }
            }
        }
    }

    async fn record_audit(
        &self,
        integration: &IntegrationRow,
        trigger: RunTrigger,
        status: &str,
        failure_kind: Option<&str>,
        detail: Option<&str>,
        duration_ms: i64,
    ) {
        if let Err(e) = audit::insert(
            self.database.pool(),
            &integration.user_id,
            &integration.integration_id,
            trigger.as_str(),
            status,
            failure_kind,
            detail,
            duration_ms,
        )
        .await
        {
            tracing::error!(error = %e, "Failed to write audit row");
        }
    }

    /// Periodic batch runs until shutdown.
    pub fn start_scheduler_task(
        self: Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let interval_secs = self.config.scheduler.interval_secs;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            // The first tick fires immediately; skip it so startup stays quiet
            interval.tick().await;
            tracing::info!(interval_secs, "Scheduler started");

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("Scheduler stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        self.run_batch(RunTrigger::Scheduled).await;
                    }
                }
            }
        })
    }
}

struct UnitGuard<'a> {
    active: &'a DashMap<UnitKey, ()>,
    key: UnitKey,
}

impl Drop for UnitGuard<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
