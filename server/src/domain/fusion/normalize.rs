//! Metric normalization into the four score dimensions
//!
//! Every dimension score is bounded to [0, 100] no matter how degenerate
//! the input ranges are.

use super::category::{CategoryProfile, Dimension, DimensionRule};
use super::extract::RawMetricBag;
use crate::core::config::FusionConfig;

/// Rescale `value` from [min, max] to [0, 100], clamped.
///
/// A degenerate range (min == max) yields the neutral midpoint 50.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() < f64::EPSILON {
        return 50.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// The four normalized dimension scores for one unit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DimensionScores {
    pub activity: f64,
    pub participation: f64,
    pub responsiveness: f64,
    pub throughput: f64,
}

impl DimensionScores {
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Activity => self.activity,
            Dimension::Participation => self.participation,
            Dimension::Responsiveness => self.responsiveness,
            Dimension::Throughput => self.throughput,
        }
    }

    fn set(&mut self, dim: Dimension, value: f64) {
        match dim {
            Dimension::Activity => self.activity = value,
            Dimension::Participation => self.participation = value,
            Dimension::Responsiveness => self.responsiveness = value,
            Dimension::Throughput => self.throughput = value,
        }
    }
}

/// Pick the scaling range for one dimension, preferring a configured
/// "category.dimension" override over the profile's built-in range.
fn effective_range(
    config: &FusionConfig,
    profile: &CategoryProfile,
    dim: Dimension,
    min: f64,
    max: f64,
) -> (f64, f64) {
    let key = format!("{}.{}", profile.category.as_str(), dim.as_str());
    config.range_overrides.get(&key).copied().unwrap_or((min, max))
}

/// Apply one dimension rule to the raw metric bag
fn apply_rule(
    rule: &DimensionRule,
    bag: &RawMetricBag,
    config: &FusionConfig,
    profile: &CategoryProfile,
    dim: Dimension,
) -> f64 {
    match rule {
        DimensionRule::Scaled { metric, min, max } => {
            let (min, max) = effective_range(config, profile, dim, *min, *max);
            normalize(bag.get(metric), min, max)
        }
        DimensionRule::InverseScaled { metric, min, max } => {
            let (min, max) = effective_range(config, profile, dim, *min, *max);
            100.0 - normalize(bag.get(metric), min, max)
        }
        DimensionRule::Ratio {
            numerator,
            denominator,
        } => {
            let den = bag.get(denominator);
            if den <= 0.0 {
                // No denominator signal: neutral, not zero
                50.0
            } else {
                (bag.get(numerator) / den * 100.0).clamp(0.0, 100.0)
            }
        }
        DimensionRule::Neutral => 50.0,
    }
}

/// Score all four dimensions of a unit from its raw metric bag
pub fn score_dimensions(
    profile: &CategoryProfile,
    bag: &RawMetricBag,
    config: &FusionConfig,
) -> DimensionScores {
    let mut scores = DimensionScores::default();
    for dim in Dimension::all() {
        scores.set(*dim, apply_rule(profile.rule(*dim), bag, config, profile, *dim));
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::RawEvent;
    use crate::domain::fusion::category::ServiceCategory;
    use crate::domain::fusion::extract::extract;

    fn bag_from(category: ServiceCategory, metadata: &str) -> RawMetricBag {
        let event = RawEvent {
            id: cuid2::create_id(),
            user_id: "u".to_string(),
            integration_id: "i".to_string(),
            service_name: "svc".to_string(),
            event_type: "activity".to_string(),
            occurred_at: 1000,
            metadata: Some(metadata.to_string()),
            created_at: 1000,
        };
        extract(category, &[event])
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize(500.0, 0.0, 1000.0), 50.0);
        assert_eq!(normalize(0.0, 0.0, 1000.0), 0.0);
        assert_eq!(normalize(1000.0, 0.0, 1000.0), 100.0);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(normalize(2000.0, 0.0, 1000.0), 100.0);
        assert_eq!(normalize(-50.0, 0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_normalize_degenerate_range_is_neutral() {
        assert_eq!(normalize(7.0, 10.0, 10.0), 50.0);
    }

    #[test]
    fn test_ratio_zero_denominator_is_neutral() {
        // Project management throughput is the completed/task ratio
        let bag = bag_from(ServiceCategory::ProjectManagement, r#"{"comment_count": 3}"#);
        let profile = ServiceCategory::ProjectManagement.profile();
        let scores = score_dimensions(&profile, &bag, &FusionConfig::default());
        assert_eq!(scores.throughput, 50.0);
    }

    #[test]
    fn test_ratio_clamped_to_100() {
        let bag = bag_from(
            ServiceCategory::ProjectManagement,
            r#"{"completed_count": 20, "task_count": 10}"#,
        );
        let profile = ServiceCategory::ProjectManagement.profile();
        let scores = score_dimensions(&profile, &bag, &FusionConfig::default());
        assert_eq!(scores.throughput, 100.0);
    }

    #[test]
    fn test_scores_always_bounded() {
        let bag = bag_from(
            ServiceCategory::Communication,
            r#"{"message_count": 999999, "reply_count": -5}"#,
        );
        let profile = ServiceCategory::Communication.profile();
        let scores = score_dimensions(&profile, &bag, &FusionConfig::default());
        for dim in crate::domain::fusion::category::Dimension::all() {
            let v = scores.get(*dim);
            assert!((0.0..=100.0).contains(&v), "{:?} out of bounds: {}", dim, v);
        }
    }

    #[test]
    fn test_inverse_scaled_rewards_low_values() {
        // Support responsiveness is inverse-scaled response time
        let fast = bag_from(
            ServiceCategory::Support,
            r#"{"avg_first_response_minutes": 5}"#,
        );
        let slow = bag_from(
            ServiceCategory::Support,
            r#"{"avg_first_response_minutes": 200}"#,
        );
        let profile = ServiceCategory::Support.profile();
        let config = FusionConfig::default();
        let fast_score = score_dimensions(&profile, &fast, &config).responsiveness;
        let slow_score = score_dimensions(&profile, &slow, &config).responsiveness;
        assert!(fast_score > slow_score);
    }

    #[test]
    fn test_range_override_changes_scaled_score() {
        let bag = bag_from(ServiceCategory::ProjectManagement, r#"{"task_count": 5}"#);
        let profile = ServiceCategory::ProjectManagement.profile();

        // Built-in range scales task_count over 0..200
        let default_score = score_dimensions(&profile, &bag, &FusionConfig::default()).activity;
        assert_eq!(default_score, 2.5);

        let mut config = FusionConfig::default();
        config
            .range_overrides
            .insert("project_management.activity".to_string(), (0.0, 10.0));
        let overridden = score_dimensions(&profile, &bag, &config).activity;
        assert_eq!(overridden, 50.0);
    }

    #[test]
    fn test_range_override_other_category_ignored() {
        let bag = bag_from(ServiceCategory::ProjectManagement, r#"{"task_count": 5}"#);
        let profile = ServiceCategory::ProjectManagement.profile();

        let mut config = FusionConfig::default();
        config
            .range_overrides
            .insert("communication.activity".to_string(), (0.0, 10.0));
        let score = score_dimensions(&profile, &bag, &config).activity;
        assert_eq!(score, 2.5);
    }
}
