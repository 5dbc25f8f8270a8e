//! Anomaly query and scan endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::types::{ApiError, validate_anomaly_limit, validate_id};
use crate::core::constants::QUERY_DEFAULT_ANOMALY_LIMIT;
use crate::data::sqlite::repositories::anomalies;
use crate::data::types::AnomalyRow;
use crate::domain::fusion::orchestrator::ScanOutcome;

use super::ApiState;
use super::fusion::map_pipeline_error;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnomaliesQuery {
    #[validate(custom(function = "validate_anomaly_limit"))]
    #[serde(default = "default_anomaly_limit")]
    pub limit: u32,
}

fn default_anomaly_limit() -> u32 {
    QUERY_DEFAULT_ANOMALY_LIMIT
}

/// List a user's most recent anomalies
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/anomalies",
    tag = "anomalies",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("limit" = Option<u32>, Query, description = "Maximum rows returned")
    ),
    responses(
        (status = 200, description = "Recent anomalies, newest first", body = [AnomalyRow]),
        (status = 400, description = "Invalid limit")
    )
)]
pub async fn list_anomalies(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<AnomaliesQuery>,
) -> Result<Json<Vec<AnomalyRow>>, ApiError> {
    validate_id(&user_id)
        .map_err(|e| ApiError::bad_request("INVALID_USER_ID", e.to_string()))?;
    query.validate().map_err(ApiError::from_validation)?;

    let rows = anomalies::list_recent(state.database.pool(), &user_id, query.limit)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScanRequest {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
    #[validate(custom(function = "validate_id"))]
    pub integration_id: String,
}

/// Run a detection-only anomaly scan for one unit
#[utoipa::path(
    post,
    path = "/api/v1/anomaly/scan",
    tag = "anomalies",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan outcome", body = ScanOutcome),
        (status = 404, description = "Unknown integration")
    )
)]
pub async fn scan_anomalies(
    State(state): State<ApiState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanOutcome>, ApiError> {
    request.validate().map_err(ApiError::from_validation)?;

    let outcome = state
        .orchestrator
        .scan_anomalies(&request.user_id, &request.integration_id)
        .await
        .map_err(map_pipeline_error)?;
    Ok(Json(outcome))
}
