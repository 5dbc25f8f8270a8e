//! Shared statistics primitives
//!
//! Small numeric helpers used by the scoring, weighting, and anomaly
//! modules. All functions are total: degenerate inputs (empty series,
//! zero baselines) produce defined neutral values instead of NaN or
//! infinity.

/// Policy for percentage change when the baseline is zero.
///
/// Two call sites intentionally disagree on this case and the policy makes
/// the choice explicit at each one:
/// - trend math treats a zero baseline as "no signal" and returns 0,
/// - the error-rate detector treats "was zero, now nonzero" as a maximal
///   deviation and returns a capped sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroBaseline {
    /// Zero or negative baseline yields 0% change.
    Neutral,
    /// Zero baseline with a positive observation yields the sentinel
    /// deviation; computed deviations are capped at the same value.
    Saturated,
}

/// Sentinel percentage returned by [`ZeroBaseline::Saturated`].
pub const SATURATED_PCT: f64 = 1000.0;

/// Percentage change from `previous` to `current`.
///
/// `(current - previous) / previous * 100`, with the zero-baseline case
/// resolved by `policy`.
pub fn pct_change(current: f64, previous: f64, policy: ZeroBaseline) -> f64 {
    if previous <= 0.0 {
        return match policy {
            ZeroBaseline::Neutral => 0.0,
            ZeroBaseline::Saturated => {
                if current > 0.0 {
                    SATURATED_PCT
                } else {
                    0.0
                }
            }
        };
    }
    let change = (current - previous) / previous * 100.0;
    match policy {
        ZeroBaseline::Neutral => change,
        ZeroBaseline::Saturated => change.min(SATURATED_PCT),
    }
}

/// Arithmetic mean; 0 for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than 2 points.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Coefficient of variation (`std_dev / mean`) clamped to [0, 1].
///
/// Returns 0 for series with fewer than 2 points or a zero mean (a
/// non-negative series with zero mean is all zeros, so there is no
/// dispersion to report).
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    (std_dev(values) / m.abs()).clamp(0.0, 1.0)
}

/// Ordinary least-squares slope of a series indexed 0..n-1, oldest first.
///
/// The x axis is the sample index, so the slope is "value change per
/// observation". Fewer than 2 points yields 0, as does a degenerate
/// denominator.
pub fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    if den.abs() < f64::EPSILON {
        return 0.0;
    }
    num / den
}

/// Z-score of each value against the series' own mean/stddev.
///
/// A zero-dispersion series yields all-zero scores.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let sd = std_dev(values);
    if sd < f64::EPSILON {
        return vec![0.0; values.len()];
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) / sd).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_std_dev_single_point_is_zero() {
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn test_std_dev_known_value() {
        // Population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is 2.0
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cv_constant_series_is_zero() {
        assert_eq!(coefficient_of_variation(&[10.0, 10.0, 10.0]), 0.0);
    }

    #[test]
    fn test_cv_clamped_to_one() {
        // stddev far exceeds the mean here
        let cv = coefficient_of_variation(&[0.0, 0.0, 0.0, 100.0]);
        assert!(cv <= 1.0);
    }

    #[test]
    fn test_cv_all_zero_series() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_pct_change_neutral_zero_baseline() {
        // previous 0, current 5 must not explode to infinity
        assert_eq!(pct_change(5.0, 0.0, ZeroBaseline::Neutral), 0.0);
    }

    #[test]
    fn test_pct_change_saturated_zero_baseline() {
        assert_eq!(pct_change(5.0, 0.0, ZeroBaseline::Saturated), SATURATED_PCT);
        assert_eq!(pct_change(0.0, 0.0, ZeroBaseline::Saturated), 0.0);
    }

    #[test]
    fn test_pct_change_saturated_caps_large_deviation() {
        // 0.1 -> 50 is a 49900% jump; the sentinel is also the ceiling
        assert_eq!(
            pct_change(50.0, 0.1, ZeroBaseline::Saturated),
            SATURATED_PCT
        );
    }

    #[test]
    fn test_pct_change_latency_spike() {
        // 200ms baseline to 2500ms observed
        let dev = pct_change(2500.0, 200.0, ZeroBaseline::Neutral);
        assert!((dev - 1150.0).abs() < 1e-9);
    }

    #[test]
    fn test_pct_change_decrease() {
        let change = pct_change(50.0, 100.0, ZeroBaseline::Neutral);
        assert!((change - (-50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ols_slope_short_series_is_zero() {
        assert_eq!(ols_slope(&[]), 0.0);
        assert_eq!(ols_slope(&[7.0]), 0.0);
    }

    #[test]
    fn test_ols_slope_linear_series() {
        let slope = ols_slope(&[1.0, 2.0, 3.0, 4.0]);
        assert!((slope - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ols_slope_declining_series() {
        let slope = ols_slope(&[10.0, 8.0, 6.0]);
        assert!((slope - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ols_slope_flat_series() {
        assert_eq!(ols_slope(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_z_scores_constant_series() {
        assert_eq!(z_scores(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_z_scores_symmetry() {
        let z = z_scores(&[10.0, 20.0, 30.0]);
        assert!((z[0] + z[2]).abs() < 1e-9);
        assert!(z[1].abs() < 1e-9);
        assert!(z[2] > 0.0);
    }
}
