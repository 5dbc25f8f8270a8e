//! Insight query endpoints

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use crate::api::types::{ApiError, validate_id};
use crate::data::sqlite::repositories::insights;
use crate::data::types::InsightRow;

use super::ApiState;

#[derive(Debug, Deserialize)]
pub struct InsightsPath {
    pub user_id: String,
    pub service_name: String,
}

/// List insights for a user's service
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/services/{service_name}/insights",
    tag = "insights",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("service_name" = String, Path, description = "Service name")
    ),
    responses(
        (status = 200, description = "Current insights for the service", body = [InsightRow])
    )
)]
pub async fn list_insights(
    State(state): State<ApiState>,
    Path(path): Path<InsightsPath>,
) -> Result<Json<Vec<InsightRow>>, ApiError> {
    validate_id(&path.user_id)
        .map_err(|e| ApiError::bad_request("INVALID_USER_ID", e.to_string()))?;
    validate_id(&path.service_name)
        .map_err(|e| ApiError::bad_request("INVALID_SERVICE_NAME", e.to_string()))?;

    let rows = insights::list(state.database.pool(), &path.user_id, &path.service_name)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(rows))
}
