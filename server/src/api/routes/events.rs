//! Event ingestion endpoints

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::types::{ApiError, validate_event_batch, validate_id};
use crate::data::sqlite::repositories::events::{self, NewEvent};
use crate::data::sqlite::repositories::integrations;

use super::ApiState;

/// One workspace event as submitted by an integration connector
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct IngestEvent {
    #[validate(custom(function = "validate_id"))]
    pub user_id: String,
    #[validate(custom(function = "validate_id"))]
    pub integration_id: String,
    #[validate(length(min = 1, max = 128))]
    pub service_name: String,
    /// Service category; unrecognized or absent values score as `general`
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub event_type: String,
    /// Unix seconds
    pub occurred_at: i64,
    /// Free-form metric payload
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IngestRequest {
    #[validate(custom(function = "validate_event_batch"))]
    #[validate(nested)]
    pub events: Vec<IngestEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub accepted: u64,
    /// Distinct integrations touched by this batch
    pub integrations: usize,
}

/// Ingest a batch of events
///
/// Registers any previously unseen (user, integration) pairs as enabled
/// integrations as a side effect.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "events",
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Events accepted", body = IngestResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn ingest_events(
    State(state): State<ApiState>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    request.validate().map_err(ApiError::from_validation)?;

    let pool = state.database.pool();

    // One upsert per distinct unit, last event in the batch wins
    let mut units: BTreeMap<(String, String), (&str, &str)> = BTreeMap::new();
    for event in &request.events {
        units.insert(
            (event.user_id.clone(), event.integration_id.clone()),
            (
                event.service_name.as_str(),
                event.category.as_deref().unwrap_or("general"),
            ),
        );
    }
    for ((user_id, integration_id), (service_name, category)) in &units {
        integrations::upsert(pool, user_id, integration_id, service_name, category)
            .await
            .map_err(ApiError::from_sqlite)?;
    }

    let new_events: Vec<NewEvent> = request
        .events
        .iter()
        .map(|e| NewEvent {
            user_id: e.user_id.clone(),
            integration_id: e.integration_id.clone(),
            service_name: e.service_name.clone(),
            event_type: e.event_type.clone(),
            occurred_at: e.occurred_at,
            metadata: e.metadata.as_ref().map(|m| m.to_string()),
        })
        .collect();
    let accepted = events::insert_events(pool, &new_events)
        .await
        .map_err(ApiError::from_sqlite)?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            accepted,
            integrations: units.len(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> IngestEvent {
        IngestEvent {
            user_id: "u".to_string(),
            integration_id: "slack-1".to_string(),
            service_name: "slack".to_string(),
            category: Some("communication".to_string()),
            event_type: "activity".to_string(),
            occurred_at: 1_700_000_000,
            metadata: Some(serde_json::json!({"message_count": 4})),
        }
    }

    #[test]
    fn test_batch_validation_accepts_events() {
        let request = IngestRequest {
            events: vec![event()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_batch_rejected() {
        let request = IngestRequest { events: vec![] };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_invalid_event_id_rejected() {
        let mut bad = event();
        bad.user_id = String::new();
        let request = IngestRequest { events: vec![bad] };
        assert!(request.validate().is_err());
    }
}
