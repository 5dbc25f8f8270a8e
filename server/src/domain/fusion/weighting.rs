//! Adaptive metric weighting
//!
//! Base weights come from the category profile; recalibration adjusts
//! them from observed history. Volatile metrics (high coefficient of
//! variation) get boosted so the score reacts, stable well-observed
//! metrics earn a confidence boost, and metrics that just shadow other
//! metrics are discounted through a correlation penalty. Final weights
//! always sum to 1.

use crate::core::config::FusionConfig;
use crate::utils::stats::coefficient_of_variation;

/// One metric's history going into recalibration
#[derive(Debug, Clone)]
pub struct MetricWeightInput {
    pub name: String,
    pub base_weight: f64,
    /// Recorded values, oldest first
    pub history: Vec<f64>,
}

/// One metric's recalibrated weight
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWeight {
    pub name: String,
    pub base_weight: f64,
    pub final_weight: f64,
    pub variance: f64,
    pub confidence: f64,
    pub adjustment_reason: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeightingOutcome {
    /// Nothing to weight; keep whatever weights exist
    NoData,
    Weights(Vec<MetricWeight>),
}

/// Recalibrate metric weights from history.
///
/// `score_history` stands in for metrics whose own history is too short
/// to estimate variance from.
pub fn recalibrate(
    inputs: &[MetricWeightInput],
    score_history: &[f64],
    config: &FusionConfig,
) -> WeightingOutcome {
    if inputs.is_empty() {
        return WeightingOutcome::NoData;
    }

    let mut weights: Vec<MetricWeight> = inputs
        .iter()
        .map(|input| {
            let variance = if input.history.len() >= 2 {
                coefficient_of_variation(&input.history)
            } else if score_history.len() >= 2 {
                coefficient_of_variation(score_history)
            } else {
                0.0
            };
            let confidence = (1.0 - variance).clamp(0.0, 1.0);
            let penalty = correlation_penalty(input, inputs);

            let raw = input.base_weight
                * (1.0 + config.variance_coefficient * variance
                    + config.confidence_coefficient * confidence
                    - config.correlation_coefficient * penalty);

            let adjustment_reason = if variance > 0.5 {
                "high_variance"
            } else if confidence > 0.8 {
                "high_confidence"
            } else {
                "balanced"
            };

            MetricWeight {
                name: input.name.clone(),
                base_weight: input.base_weight,
                final_weight: raw,
                variance,
                confidence,
                adjustment_reason,
            }
        })
        .collect();

    let total: f64 = weights.iter().map(|w| w.final_weight).sum();
    if total > 0.0 && total.is_finite() {
        for w in &mut weights {
            w.final_weight /= total;
        }
    } else {
        // Degenerate adjustments collapse to uniform weights
        let uniform = 1.0 / weights.len() as f64;
        for w in &mut weights {
            w.final_weight = uniform;
        }
    }

    WeightingOutcome::Weights(weights)
}

/// Mean absolute Pearson correlation against every other metric's history.
///
/// Pairs without enough overlapping points contribute nothing, so a metric
/// with no usable peers has zero penalty.
fn correlation_penalty(input: &MetricWeightInput, all: &[MetricWeightInput]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for other in all {
        if other.name == input.name {
            continue;
        }
        if let Some(r) = pearson(&input.history, &other.history) {
            sum += r.abs();
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

/// Pearson correlation over the overlapping tail of two series.
///
/// None when fewer than 3 points overlap or either side has no dispersion.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 3 {
        return None;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a < f64::EPSILON || var_b < f64::EPSILON {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
