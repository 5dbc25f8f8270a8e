//! workfuse server library
//!
//! Multi-tenant fusion intelligence scoring for workspace integrations.
//! Ingests raw integration events, normalizes heterogeneous metrics into
//! comparable scales, computes adaptively-weighted composite health scores,
//! detects anomalies and trends, and emits human-readable insights.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
