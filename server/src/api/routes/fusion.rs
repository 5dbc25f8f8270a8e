//! Fusion pipeline endpoints

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::types::{ApiError, validate_id};
use crate::domain::fusion::orchestrator::{RunFilter, RunSummary};
use crate::domain::fusion::pipeline::PipelineError;
use crate::domain::fusion::RunTrigger;

use super::ApiState;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RunRequest {
    /// Restrict the run to one user's units
    #[validate(custom(function = "validate_id"))]
    pub user_id: Option<String>,
    /// Restrict the run to one integration
    #[validate(custom(function = "validate_id"))]
    pub integration_id: Option<String>,
}

/// Run the scoring pipeline over the enabled units, optionally narrowed
/// to one user or one integration
#[utoipa::path(
    post,
    path = "/api/v1/fusion/run",
    tag = "fusion",
    request_body(content = RunRequest, description = "Optional run filter"),
    responses(
        (status = 200, description = "Batch run summary", body = RunSummary),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn run_fusion(
    State(state): State<ApiState>,
    request: Option<Json<RunRequest>>,
) -> Result<Json<RunSummary>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate().map_err(ApiError::from_validation)?;

    let filter = RunFilter {
        user_id: request.user_id,
        integration_id: request.integration_id,
    };
    Ok(Json(
        state
            .orchestrator
            .run_batch_filtered(RunTrigger::Manual, &filter)
            .await,
    ))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecalibrateRequest {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
    #[validate(custom(function = "validate_id"))]
    pub integration_id: String,
}

/// Recalibrate a single unit on demand
#[utoipa::path(
    post,
    path = "/api/v1/fusion/recalibrate",
    tag = "fusion",
    request_body = RecalibrateRequest,
    responses(
        (status = 200, description = "Unit run summary", body = RunSummary),
        (status = 404, description = "Unknown integration")
    )
)]
pub async fn recalibrate(
    State(state): State<ApiState>,
    Json(request): Json<RecalibrateRequest>,
) -> Result<Json<RunSummary>, ApiError> {
    request.validate().map_err(ApiError::from_validation)?;

    let summary = state
        .orchestrator
        .recalibrate(&request.user_id, &request.integration_id, RunTrigger::Manual)
        .await
        .map_err(map_pipeline_error)?;
    Ok(Json(summary))
}

pub(super) fn map_pipeline_error(error: PipelineError) -> ApiError {
    match error {
        PipelineError::Processing(message) if message.starts_with("Unknown integration") => {
            ApiError::not_found("INTEGRATION_NOT_FOUND", message)
        }
        PipelineError::RateLimited(message) => ApiError::service_unavailable(message),
        other => {
            tracing::error!(error = %other, "Pipeline request failed");
            ApiError::internal("Pipeline run failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use std::time::Duration;

    #[test]
    fn test_unknown_integration_maps_to_404() {
        let error = PipelineError::Processing("Unknown integration: x".to_string());
        let response = map_pipeline_error(error).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_timeout_maps_to_500() {
        let error = PipelineError::Timeout(Duration::from_secs(8));
        let response = map_pipeline_error(error).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_maps_to_503() {
        let error = PipelineError::RateLimited("slow down".to_string());
        let response = map_pipeline_error(error).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
