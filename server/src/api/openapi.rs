//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{anomalies, events, fusion, health, insights, integrations, snapshots};
use crate::data::types::{AnomalyRow, InsightRow, IntegrationRow};
use crate::domain::fusion::orchestrator::{RunSummary, ScanOutcome};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WorkFuse API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Fusion intelligence scoring for workspace integrations"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "events", description = "Event ingestion"),
        (name = "integrations", description = "Integration management"),
        (name = "fusion", description = "Scoring pipeline runs"),
        (name = "anomalies", description = "Anomaly queries and scans"),
        (name = "insights", description = "Generated insights"),
        (name = "snapshots", description = "Score snapshots")
    ),
    paths(
        health::health,
        events::ingest_events,
        integrations::list_integrations,
        integrations::set_integration_enabled,
        fusion::run_fusion,
        fusion::recalibrate,
        anomalies::list_anomalies,
        anomalies::scan_anomalies,
        insights::list_insights,
        snapshots::list_snapshots,
    ),
    components(schemas(
        health::HealthResponse,
        events::IngestEvent,
        events::IngestRequest,
        events::IngestResponse,
        integrations::IntegrationsQuery,
        integrations::SetEnabledRequest,
        fusion::RunRequest,
        fusion::RecalibrateRequest,
        anomalies::AnomaliesQuery,
        anomalies::ScanRequest,
        snapshots::SnapshotDto,
        IntegrationRow,
        InsightRow,
        AnomalyRow,
        RunSummary,
        ScanOutcome,
    ))
)]
pub struct ApiDoc;

/// Serve the OpenAPI specification as JSON
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>WorkFuse API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;
