//! Raw metric extraction from ingested events
//!
//! Folds a window of events into a single bag of raw metric values using
//! the category's metric table. Metadata keys are unified through the
//! category's alias list, `avg_`-prefixed metrics are averaged across
//! events, everything else is summed. Only real JSON numbers count;
//! numeric strings are never coerced and land in the untyped `extra` map
//! along with unrecognized keys.

use std::collections::BTreeMap;

use crate::data::types::RawEvent;

use super::category::ServiceCategory;

/// Metadata keys carrying operational health signals, averaged per window
const SYSTEM_KEYS: &[&str] = &["latency_ms", "error_rate", "cpu_percent", "memory_percent"];

/// Averaged operational signals observed in the window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemSample {
    pub latency_ms: Option<f64>,
    pub error_rate: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

impl SystemSample {
    fn set(&mut self, key: &str, value: f64) {
        match key {
            "latency_ms" => self.latency_ms = Some(value),
            "error_rate" => self.error_rate = Some(value),
            "cpu_percent" => self.cpu_percent = Some(value),
            "memory_percent" => self.memory_percent = Some(value),
            _ => {}
        }
    }
}

/// Aggregated raw metrics for one unit and window
#[derive(Debug, Clone, Default)]
pub struct RawMetricBag {
    pub category: ServiceCategory,
    pub event_count: u64,
    /// Canonical metric name to aggregated value
    pub metrics: BTreeMap<String, f64>,
    pub system: SystemSample,
    /// Unrecognized or non-numeric metadata, last write wins
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawMetricBag {
    /// Value of a canonical metric; absent metrics read as 0
    pub fn get(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }
}

/// Running (sum, count) accumulator per metric
#[derive(Default)]
struct Acc {
    sum: f64,
    count: u64,
}

/// Fold a window of events into a raw metric bag
pub fn extract(category: ServiceCategory, events: &[RawEvent]) -> RawMetricBag {
    let profile = category.profile();

    // Alias -> canonical name lookup
    let mut canonical: BTreeMap<&str, &str> = BTreeMap::new();
    for spec in profile.metrics {
        canonical.insert(spec.name, spec.name);
        for alias in spec.aliases {
            canonical.insert(alias, spec.name);
        }
    }

    let mut metric_acc: BTreeMap<String, Acc> = BTreeMap::new();
    let mut system_acc: BTreeMap<&'static str, Acc> = BTreeMap::new();
    let mut extra: BTreeMap<String, serde_json::Value> = BTreeMap::new();

    for event in events {
        let Some(metadata) = &event.metadata else {
            continue;
        };
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str(metadata) else {
            tracing::trace!(event_id = %event.id, "Skipping non-object event metadata");
            continue;
        };

        for (key, value) in map {
            let number = match &value {
                serde_json::Value::Number(n) => n.as_f64(),
                _ => None,
            };
            let Some(number) = number else {
                // Strings and other shapes are never coerced
                extra.insert(key, value);
                continue;
            };
            if !number.is_finite() {
                continue;
            }

            if let Some(system_key) = SYSTEM_KEYS.iter().find(|k| **k == key) {
                let acc = system_acc.entry(system_key).or_default();
                acc.sum += number;
                acc.count += 1;
                continue;
            }

            match canonical.get(key.as_str()) {
                Some(name) => {
                    let acc = metric_acc.entry((*name).to_string()).or_default();
                    acc.sum += number;
                    acc.count += 1;
                }
                None => {
                    extra.insert(key, value);
                }
            }
        }
    }

    let metrics = metric_acc
        .into_iter()
        .map(|(name, acc)| {
            // avg_ metrics report the per-event average, the rest the sum
            let value = if name.starts_with("avg_") && acc.count > 0 {
                acc.sum / acc.count as f64
            } else {
                acc.sum
            };
            (name, value)
        })
        .collect();

    let mut system = SystemSample::default();
    for (key, acc) in system_acc {
        if acc.count > 0 {
            system.set(key, acc.sum / acc.count as f64);
        }
    }

    RawMetricBag {
        category,
        event_count: events.len() as u64,
        metrics,
        system,
        extra,
    }
}
