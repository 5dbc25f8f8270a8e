//! API route handlers

pub mod anomalies;
pub mod events;
pub mod fusion;
pub mod health;
pub mod insights;
pub mod integrations;
pub mod snapshots;

use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::data::sqlite::SqliteService;
use crate::domain::fusion::Orchestrator;

/// Shared state for all API endpoints
#[derive(Clone)]
pub struct ApiState {
    pub database: Arc<SqliteService>,
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<Orchestrator>,
}
