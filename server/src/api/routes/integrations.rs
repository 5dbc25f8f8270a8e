//! Integration management endpoints

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::types::{ApiError, validate_id};
use crate::data::sqlite::repositories::integrations;
use crate::data::types::IntegrationRow;

use super::ApiState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IntegrationsQuery {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
}

/// List a user's integrations
#[utoipa::path(
    get,
    path = "/api/v1/integrations",
    tag = "integrations",
    params(
        ("user_id" = String, Query, description = "User ID")
    ),
    responses(
        (status = 200, description = "Integrations for the user", body = [IntegrationRow])
    )
)]
pub async fn list_integrations(
    State(state): State<ApiState>,
    Query(query): Query<IntegrationsQuery>,
) -> Result<Json<Vec<IntegrationRow>>, ApiError> {
    query.validate().map_err(ApiError::from_validation)?;

    let rows = integrations::list_for_user(state.database.pool(), &query.user_id)
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetEnabledRequest {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
    pub enabled: bool,
}

/// Enable or disable an integration
///
/// Disabled integrations keep their data but are excluded from batch runs.
#[utoipa::path(
    patch,
    path = "/api/v1/integrations/{integration_id}",
    tag = "integrations",
    params(
        ("integration_id" = String, Path, description = "Integration ID")
    ),
    request_body = SetEnabledRequest,
    responses(
        (status = 200, description = "Integration updated", body = IntegrationRow),
        (status = 404, description = "Unknown integration")
    )
)]
pub async fn set_integration_enabled(
    State(state): State<ApiState>,
    Path(integration_id): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<IntegrationRow>, ApiError> {
    request.validate().map_err(ApiError::from_validation)?;

    let pool = state.database.pool();
    let updated = integrations::set_enabled(pool, &request.user_id, &integration_id, request.enabled)
        .await
        .map_err(ApiError::from_sqlite)?;
    if !updated {
        return Err(ApiError::not_found(
            "INTEGRATION_NOT_FOUND",
            format!("Unknown integration: {integration_id}"),
        ));
    }

    let row = integrations::get(pool, &request.user_id, &integration_id)
        .await
        .map_err(ApiError::from_sqlite)?
        .ok_or_else(|| {
            ApiError::not_found(
                "INTEGRATION_NOT_FOUND",
                format!("Unknown integration: {integration_id}"),
            )
        })?;
    Ok(Json(row))
}
