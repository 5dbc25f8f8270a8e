//! Trend analysis and short-range forecasting
//!
//! Direction is decided from week-over-week event volume when a previous
//! window exists, otherwise from the slope of the unit's score history.
//! The forecast is a weighted average of recent scores with the heaviest
//! weight on the most recent point.

use crate::core::config::FusionConfig;
use crate::utils::stats::{mean, ols_slope, pct_change, ZeroBaseline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "stable" => Some(Self::Stable),
            _ => None,
        }
    }
}

/// Trend verdict for one unit and window
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSummary {
    /// Week-over-week change in event volume, percent
    pub wow_change_pct: f64,
    /// OLS slope of the score history, points per run
    pub slope: f64,
    pub direction: TrendDirection,
    /// Weighted forecast of the next score; None without history
    pub forecast: Option<f64>,
}

/// Analyze trend from event volume and score history (oldest first).
pub fn analyze(
    current_count: f64,
    previous_count: f64,
    history: &[f64],
    config: &FusionConfig,
) -> TrendSummary {
    let wow_change_pct = pct_change(current_count, previous_count, ZeroBaseline::Neutral);
    let slope = ols_slope(history);

    // Without a previous window the volume change carries no information,
    // so fall back to the score trajectory expressed as a percentage.
    let signal = if previous_count > 0.0 {
        wow_change_pct
    } else {
        slope_pct(slope, history)
    };

    let direction = if signal > config.trend_threshold_pct {
        TrendDirection::Up
    } else if signal < -config.trend_threshold_pct {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    TrendSummary {
        wow_change_pct,
        slope,
        direction,
        forecast: weighted_forecast(history, &config.forecast_weights),
    }
}

/// Slope as a percentage of the series mean; 0 when the mean vanishes.
fn slope_pct(slope: f64, history: &[f64]) -> f64 {
    let m = mean(history);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    slope / m * 100.0
}

/// Weighted average of the most recent points, newest weighted heaviest.
///
/// `history` is oldest first; `weights[0]` applies to the newest point.
/// When the history is shorter than the weight vector, only the weights
/// actually used contribute to the normalizer. Empty history yields None.
pub fn weighted_forecast(history: &[f64], weights: &[f64]) -> Option<f64> {
    if history.is_empty() || weights.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (value, weight) in history.iter().rev().zip(weights.iter()) {
        weighted_sum += value * weight;
        weight_total += weight;
    }
    if weight_total <= 0.0 {
        return None;
    }
    Some(weighted_sum / weight_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_up_from_volume() {
        let summary = analyze(120.0, 100.0, &[], &FusionConfig::default());
        assert_eq!(summary.direction, TrendDirection::Up);
        assert!((summary.wow_change_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_down_from_volume() {
        let summary = analyze(80.0, 100.0, &[], &FusionConfig::default());
        assert_eq!(summary.direction, TrendDirection::Down);
    }

    #[test]
    fn test_direction_stable_within_threshold() {
        let summary = analyze(103.0, 100.0, &[], &FusionConfig::default());
        assert_eq!(summary.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_slope_fallback_without_previous_window() {
        // No previous volume: a rising score history should still read as up
        let history = vec![40.0, 50.0, 60.0, 70.0];
        let summary = analyze(10.0, 0.0, &history, &FusionConfig::default());
        assert_eq!(summary.direction, TrendDirection::Up);
        assert!(summary.slope > 0.0);
    }

    #[test]
    fn test_flat_history_without_previous_window_is_stable() {
        let history = vec![55.0, 55.0, 55.0];
        let summary = analyze(10.0, 0.0, &history, &FusionConfig::default());
        assert_eq!(summary.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_forecast_weights_newest_heaviest() {
        // Newest point 80 gets weight 0.4, so the forecast leans toward it
        let history = vec![20.0, 40.0, 60.0, 80.0];
        let forecast = weighted_forecast(&history, &[0.4, 0.3, 0.2, 0.1]).unwrap();
        let expected = 80.0 * 0.4 + 60.0 * 0.3 + 40.0 * 0.2 + 20.0 * 0.1;
        assert!((forecast - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_short_history_renormalizes() {
        // Two points use only the first two weights
        let forecast = weighted_forecast(&[60.0, 80.0], &[0.4, 0.3, 0.2, 0.1]).unwrap();
        let expected = (80.0 * 0.4 + 60.0 * 0.3) / 0.7;
        assert!((forecast - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_empty_history_is_none() {
        assert_eq!(weighted_forecast(&[], &[0.4, 0.3, 0.2, 0.1]), None);
    }

    #[test]
    fn test_forecast_single_point_is_that_point() {
        let forecast = weighted_forecast(&[72.0], &[0.4, 0.3, 0.2, 0.1]).unwrap();
        assert!((forecast - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_parse_round_trip() {
        for dir in [TrendDirection::Up, TrendDirection::Down, TrendDirection::Stable] {
            assert_eq!(TrendDirection::parse(dir.as_str()), Some(dir));
        }
        assert_eq!(TrendDirection::parse("sideways"), None);
    }
}
