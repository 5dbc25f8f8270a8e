//! Fusion scoring pipeline
//!
//! Extraction of raw metrics from events, normalization into the four
//! score dimensions, adaptive weighting, trend analysis, and the batch
//! orchestrator that ties them together per scoring unit.

pub mod category;
pub mod extract;
pub mod normalize;
pub mod orchestrator;
pub mod persist;
pub mod pipeline;
pub mod trend;
pub mod weighting;

pub use category::{CategoryProfile, Dimension, ServiceCategory};
pub use orchestrator::{Orchestrator, RunSummary, RunTrigger};
pub use pipeline::{PipelineError, UnitKey};
