//! Snapshot query endpoints
//!
//! Snapshots expose a coarse display state instead of raw run timestamps
//! and failure details; those stay internal to the audit log.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::types::{ApiError, validate_id};
use crate::core::constants::SNAPSHOT_FRESH_SECS;
use crate::data::sqlite::repositories::snapshots;
use crate::data::types::SnapshotRow;
use crate::utils::time::now_secs;

use super::ApiState;

/// One unit's scores as presented to clients
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotDto {
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
    /// Share of the user's total fusion score, percent
    pub fusion_contribution: f64,
    /// fresh, stale, failing, or unknown
    pub display_state: &'static str,
}

/// Derive the client-facing state from run bookkeeping
fn display_state(row: &SnapshotRow, now: i64) -> &'static str {
    match (row.last_successful_run_at, row.last_failed_run_at) {
        (None, None) => "unknown",
        (None, Some(_)) => "failing",
        (Some(success), Some(failure)) if failure > success => "failing",
        (Some(success), _) if now - success <= SNAPSHOT_FRESH_SECS => "fresh",
        (Some(_), _) => "stale",
    }
}

/// List a user's score snapshots
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/snapshots",
    tag = "snapshots",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Score snapshots per integration", body = [SnapshotDto])
    )
)]
pub async fn list_snapshots(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<SnapshotDto>>, ApiError> {
    validate_id(&user_id)
        .map_err(|e| ApiError::bad_request("INVALID_USER_ID", e.to_string()))?;

    let rows = snapshots::list_for_user(state.database.pool(), &user_id)
        .await
        .map_err(ApiError::from_sqlite)?;

    let now = now_secs();
    let dtos = rows
        .into_iter()
        .map(|row| {
            let state = display_state(&row, now);
            SnapshotDto {
                integration_id: row.integration_id,
                service_name: row.service_name,
                category: row.category,
                activity: row.activity,
                participation: row.participation,
                responsiveness: row.responsiveness,
                throughput: row.throughput,
                fusion_score: row.fusion_score,
                trend_direction: row.trend_direction,
                anomaly_detected: row.anomaly_detected,
                fusion_contribution: row.fusion_contribution,
                display_state: state,
            }
        })
        .collect();
    Ok(Json(dtos))
}
