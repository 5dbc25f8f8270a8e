//! Anomaly detection and explanation

pub mod detect;
pub mod explain;

pub use detect::{detect, DetectedAnomaly, DetectorInput, Severity};
pub use explain::{build_explainer, explain_or_fallback, Explainer};
