//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::{get, patch, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{
    ApiState, anomalies, events, fusion, health, insights, integrations, snapshots,
};
use crate::core::CoreApp;
use crate::core::constants::{DEFAULT_BODY_LIMIT, EVENTS_BODY_LIMIT};

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        // Clone shutdown before moving app
        let shutdown = app.shutdown.clone();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(host.parse()?, port);

        let state = ApiState {
            database: app.database.clone(),
            config: app.config.clone(),
            orchestrator: app.orchestrator.clone(),
        };

        // Ingestion accepts larger payloads than the rest of the API
        let events_routes = Router::new()
            .route("/", post(events::ingest_events))
            .layer(DefaultBodyLimit::max(EVENTS_BODY_LIMIT))
            .with_state(state.clone());

        let router = Router::new()
            .route("/", get(|| async { Redirect::temporary("/api/docs") }))
            .route("/api/v1/health", get(health::health))
            .route("/api/openapi.json", get(openapi_json))
            .route("/api/docs", get(swagger_ui_html))
            .route("/api/docs/", get(swagger_ui_html))
            .nest("/api/v1/events", events_routes)
            .route("/api/v1/integrations", get(integrations::list_integrations))
            .route(
                "/api/v1/integrations/{integration_id}",
                patch(integrations::set_integration_enabled),
            )
            .route("/api/v1/fusion/run", post(fusion::run_fusion))
            .route("/api/v1/fusion/recalibrate", post(fusion::recalibrate))
            .route(
                "/api/v1/users/{user_id}/anomalies",
                get(anomalies::list_anomalies),
            )
            .route("/api/v1/anomaly/scan", post(anomalies::scan_anomalies))
            .route(
                "/api/v1/users/{user_id}/services/{service_name}/insights",
                get(insights::list_insights),
            )
            .route(
                "/api/v1/users/{user_id}/snapshots",
                get(snapshots::list_snapshots),
            )
            .with_state(state)
            .fallback(middleware::handle_404)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::cors(&allowed_origins))
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT));

        tracing::info!(addr = %addr, "API server listening");
        let listener = TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
