//! Domain logic: scoring pipeline, anomaly detection, insight generation

pub mod anomaly;
pub mod fusion;
pub mod insight;
