//! Threshold and statistical anomaly detectors
//!
//! Four threshold ladders (latency, error rate, CPU, memory) plus a
//! z-score pass over metric histories. Detectors only fire on signals
//! actually present in the window; missing signals are not anomalies.

use crate::core::config::AnomalyConfig;
use crate::utils::stats::{mean, pct_change, z_scores, ZeroBaseline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Detection confidence is never reported as certainty.
const CONFIDENCE_CAP: f64 = 95.0;

/// One detected anomaly before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedAnomaly {
    pub anomaly_type: String,
    pub category: &'static str,
    pub severity: Severity,
    pub confidence: f64,
    pub baseline: f64,
    pub observed: f64,
    pub deviation_pct: f64,
    pub detection_method: &'static str,
    pub recommended_actions: Vec<String>,
    pub explanation: Option<String>,
}

/// Signals for one unit's detection pass
#[derive(Debug, Clone, Default)]
pub struct DetectorInput {
    pub latency_ms: Option<f64>,
    pub latency_baseline: Option<f64>,
    pub error_rate: Option<f64>,
    pub error_rate_baseline: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    /// Per-metric histories, oldest first, for the statistical pass
    pub metric_series: Vec<(String, Vec<f64>)>,
    pub event_count: u64,
}

/// Run every detector over the input, worst severity first.
pub fn detect(input: &DetectorInput, config: &AnomalyConfig) -> Vec<DetectedAnomaly> {
    let mut anomalies = Vec::new();

    if let Some(anomaly) = detect_latency(input, config) {
        anomalies.push(anomaly);
    }
    if let Some(anomaly) = detect_error_rate(input, config) {
        anomalies.push(anomaly);
    }
    if let Some(anomaly) = detect_saturation(
        input.cpu_percent,
        "cpu_saturation",
        config.cpu_high,
        config.cpu_critical,
        vec![
            "Review recent workload changes".to_string(),
            "Consider scaling compute capacity".to_string(),
        ],
    ) {
        anomalies.push(anomaly);
    }
    if let Some(anomaly) = detect_saturation(
        input.memory_percent,
        "memory_saturation",
        config.memory_high,
        config.memory_critical,
        vec![
            "Check for memory growth since the last deploy".to_string(),
            "Consider raising memory limits".to_string(),
        ],
    ) {
        anomalies.push(anomaly);
    }
    anomalies.extend(detect_statistical(input, config));

    anomalies.sort_by(|a, b| b.severity.cmp(&a.severity));
    anomalies
}

fn detect_latency(input: &DetectorInput, config: &AnomalyConfig) -> Option<DetectedAnomaly> {
    let observed = input.latency_ms?;
    let baseline = input.latency_baseline.unwrap_or(0.0);
    let deviation = pct_change(observed, baseline, ZeroBaseline::Neutral);

    if !(observed > config.latency_flag_ms || deviation > config.latency_flag_pct) {
        return None;
    }

    let severity = if observed > config.latency_critical_ms || deviation > config.latency_critical_pct
    {
        Severity::Critical
    } else if observed > config.latency_high_ms || deviation > config.latency_high_pct {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(DetectedAnomaly {
        anomaly_type: "latency_spike".to_string(),
        category: "performance",
        severity,
        confidence: threshold_confidence(deviation),
        baseline,
        observed,
        deviation_pct: deviation,
        detection_method: "threshold",
        recommended_actions: vec![
            "Check the upstream service status page".to_string(),
            "Inspect recent slow requests for a common cause".to_string(),
        ],
        explanation: None,
    })
}

fn detect_error_rate(input: &DetectorInput, config: &AnomalyConfig) -> Option<DetectedAnomaly> {
    let observed = input.error_rate?;
    let baseline = input.error_rate_baseline.unwrap_or(0.0);
    // A zero baseline with errors now is maximal deviation, not no change
    let deviation = pct_change(observed, baseline, ZeroBaseline::Saturated);

    if !(observed > config.error_rate_flag || deviation > config.error_rate_flag_pct) {
        return None;
    }

    let severity = if observed > config.error_rate_critical
        || deviation > config.error_rate_critical_pct
    {
        Severity::Critical
    } else if observed > config.error_rate_high || deviation > config.error_rate_high_pct {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(DetectedAnomaly {
        anomaly_type: "error_rate_spike".to_string(),
        category: "reliability",
        severity,
        confidence: threshold_confidence(deviation),
        baseline,
        observed,
        deviation_pct: deviation,
        detection_method: "threshold",
        recommended_actions: vec![
            "Review recent error logs for the failing operation".to_string(),
            "Verify credentials and API quota for the integration".to_string(),
        ],
        explanation: None,
    })
}

fn detect_saturation(
    observed: Option<f64>,
    anomaly_type: &str,
    high: f64,
    critical: f64,
    recommended_actions: Vec<String>,
) -> Option<DetectedAnomaly> {
    let observed = observed?;
    if observed <= high {
        return None;
    }
    let severity = if observed > critical {
        Severity::Critical
    } else {
        Severity::High
    };
    let deviation = pct_change(observed, high, ZeroBaseline::Neutral);

    Some(DetectedAnomaly {
        anomaly_type: anomaly_type.to_string(),
        category: "resource",
        severity,
        confidence: threshold_confidence(deviation),
        baseline: high,
        observed,
        deviation_pct: deviation,
        detection_method: "threshold",
        recommended_actions,
        explanation: None,
    })
}

fn detect_statistical(input: &DetectorInput, config: &AnomalyConfig) -> Vec<DetectedAnomaly> {
    if input.event_count == 0 {
        return Vec::new();
    }

    let mut anomalies = Vec::new();
    for (name, series) in &input.metric_series {
        let scores = z_scores(series);
        let Some(&z) = scores.last() else {
            continue;
        };
        if z.abs() <= config.z_score_threshold {
            continue;
        }

        let baseline = mean(series);
        let observed = *series.last().unwrap_or(&0.0);
        let severity = if z.abs() > 3.0 {
            Severity::High
        } else if z.abs() > 2.5 {
            Severity::Medium
        } else {
            Severity::Low
        };

        anomalies.push(DetectedAnomaly {
            anomaly_type: format!("metric_outlier:{name}"),
            category: "statistical",
            severity,
            confidence: (40.0 + z.abs() * 20.0).min(CONFIDENCE_CAP),
            baseline,
            observed,
            deviation_pct: pct_change(observed, baseline, ZeroBaseline::Neutral),
            detection_method: "z_score",
            recommended_actions: vec![format!(
                "Compare {name} against the same period last week"
            )],
            explanation: None,
        });
    }
    anomalies
}

fn threshold_confidence(deviation_pct: f64) -> f64 {
    (50.0 + deviation_pct.abs() / 10.0).min(CONFIDENCE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_spike_is_critical() {
        // 200ms baseline to 2500ms observed: 1150% deviation
        let input = DetectorInput {
            latency_ms: Some(2500.0),
            latency_baseline: Some(200.0),
            event_count: 10,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, "latency_spike");
        assert_eq!(anomalies[0].severity, Severity::Critical);
        assert!((anomalies[0].deviation_pct - 1150.0).abs() < 1e-9);
        assert_eq!(anomalies[0].confidence, 95.0);
    }

    #[test]
    fn test_absolute_latency_flagged_without_deviation() {
        // Past the absolute threshold even with a near-identical baseline
        let input = DetectorInput {
            latency_ms: Some(2500.0),
            latency_baseline: Some(2400.0),
            event_count: 10,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, "latency_spike");
        assert_eq!(anomalies[0].severity, Severity::Medium);
    }

    #[test]
    fn test_latency_below_both_thresholds_not_flagged() {
        let input = DetectorInput {
            latency_ms: Some(1500.0),
            latency_baseline: Some(1400.0),
            event_count: 10,
            ..Default::default()
        };
        assert!(detect(&input, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_error_rate_deviation_flagged_below_absolute_threshold() {
        // 1% to 3% is a 200% jump even though the rate itself is low
        let input = DetectorInput {
            error_rate: Some(3.0),
            error_rate_baseline: Some(1.0),
            event_count: 10,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, "error_rate_spike");
        assert!((anomalies[0].deviation_pct - 200.0).abs() < 1e-9);
        assert_eq!(anomalies[0].severity, Severity::Medium);
    }

    #[test]
    fn test_missing_signals_produce_nothing() {
        let input = DetectorInput {
            event_count: 10,
            ..Default::default()
        };
        assert!(detect(&input, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_error_rate_from_zero_baseline_saturates() {
        let input = DetectorInput {
            error_rate: Some(8.0),
            error_rate_baseline: Some(0.0),
            event_count: 5,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, "error_rate_spike");
        // Sentinel deviation exceeds the critical ladder rung
        assert_eq!(anomalies[0].severity, Severity::Critical);
    }

    #[test]
    fn test_moderate_error_rate_is_medium() {
        let input = DetectorInput {
            error_rate: Some(7.0),
            error_rate_baseline: Some(3.0),
            event_count: 5,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies[0].severity, Severity::Medium);
    }

    #[test]
    fn test_cpu_and_memory_ladders() {
        let input = DetectorInput {
            cpu_percent: Some(97.0),
            memory_percent: Some(90.0),
            event_count: 3,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 2);
        // Sorted worst first
        assert_eq!(anomalies[0].anomaly_type, "cpu_saturation");
        assert_eq!(anomalies[0].severity, Severity::Critical);
        assert_eq!(anomalies[1].anomaly_type, "memory_saturation");
        assert_eq!(anomalies[1].severity, Severity::High);
    }

    #[test]
    fn test_statistical_outlier_detected() {
        let input = DetectorInput {
            metric_series: vec![(
                "message_count".to_string(),
                vec![50.0, 52.0, 48.0, 51.0, 49.0, 50.0, 120.0],
            )],
            event_count: 120,
            ..Default::default()
        };
        let anomalies = detect(&input, &AnomalyConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].detection_method, "z_score");
        assert!(anomalies[0].anomaly_type.starts_with("metric_outlier:"));
        assert!(anomalies[0].confidence <= 95.0);
    }

    #[test]
    fn test_statistical_pass_skipped_without_events() {
        let input = DetectorInput {
            metric_series: vec![(
                "message_count".to_string(),
                vec![50.0, 52.0, 48.0, 51.0, 49.0, 50.0, 120.0],
            )],
            event_count: 0,
            ..Default::default()
        };
        assert!(detect(&input, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_stable_series_not_flagged() {
        let input = DetectorInput {
            metric_series: vec![("task_count".to_string(), vec![10.0, 11.0, 10.0, 12.0, 11.0])],
            event_count: 11,
            ..Default::default()
        };
        assert!(detect(&input, &AnomalyConfig::default()).is_empty());
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        let input = DetectorInput {
            latency_ms: Some(50_000.0),
            latency_baseline: Some(100.0),
            error_rate: Some(90.0),
            error_rate_baseline: Some(0.1),
            event_count: 10,
            ..Default::default()
        };
        for anomaly in detect(&input, &AnomalyConfig::default()) {
            assert!(anomaly.confidence <= 95.0);
        }
    }
}
