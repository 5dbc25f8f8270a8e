//! Anomaly explanation
//!
//! Anomalies get a short human-readable explanation either from a local
//! template or from an external HTTP explainer service. The external path
//! is strictly best-effort: any failure falls back to the template so the
//! detection pipeline never blocks on it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::ExplainerConfig;

use super::detect::DetectedAnomaly;

/// Payload sent to the external explainer service
#[derive(Debug, Serialize)]
pub struct ExplainRequest<'a> {
    pub service_name: &'a str,
    pub anomaly_type: &'a str,
    pub severity: &'a str,
    pub baseline: f64,
    pub observed: f64,
    pub deviation_pct: f64,
}

#[derive(Debug, Deserialize)]
struct ExplainResponse {
    explanation: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("Explainer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Explainer returned empty explanation")]
    Empty,
}

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(
        &self,
        service_name: &str,
        anomaly: &DetectedAnomaly,
    ) -> Result<String, ExplainError>;
}

/// Deterministic local explanations, also the fallback path
pub struct TemplateExplainer;

#[async_trait]
impl Explainer for TemplateExplainer {
    async fn explain(
        &self,
        service_name: &str,
        anomaly: &DetectedAnomaly,
    ) -> Result<String, ExplainError> {
        Ok(format!(
            "{} on {}: observed {:.1} against a baseline of {:.1} ({:+.0}% deviation, {} severity)",
            anomaly.anomaly_type,
            service_name,
            anomaly.observed,
            anomaly.baseline,
            anomaly.deviation_pct,
            anomaly.severity.as_str(),
        ))
    }
}

/// External HTTP explainer
pub struct HttpExplainer {
    client: reqwest::Client,
    url: String,
}

impl HttpExplainer {
    pub fn new(url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

#[async_trait]
impl Explainer for HttpExplainer {
    async fn explain(
        &self,
        service_name: &str,
        anomaly: &DetectedAnomaly,
    ) -> Result<String, ExplainError> {
        let request = ExplainRequest {
            service_name,
            anomaly_type: &anomaly.anomaly_type,
            severity: anomaly.severity.as_str(),
            baseline: anomaly.baseline,
            observed: anomaly.observed,
            deviation_pct: anomaly.deviation_pct,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ExplainResponse>()
            .await?;

        let explanation = response.explanation.trim().to_string();
        if explanation.is_empty() {
            return Err(ExplainError::Empty);
        }
        Ok(explanation)
    }
}

/// Pick the explainer the configuration asks for.
pub fn build_explainer(config: &ExplainerConfig) -> std::sync::Arc<dyn Explainer> {
    match (config.enabled, &config.url) {
        (true, Some(url)) => {
            tracing::info!(url = %url, "Using external anomaly explainer");
            std::sync::Arc::new(HttpExplainer::new(url.clone(), config.timeout_secs))
        }
        _ => std::sync::Arc::new(TemplateExplainer),
    }
}

/// Explain an anomaly, degrading to the template on any failure.
pub async fn explain_or_fallback(
    explainer: &dyn Explainer,
    service_name: &str,
    anomaly: &DetectedAnomaly,
) -> String {
    match explainer.explain(service_name, anomaly).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                service = service_name,
                anomaly_type = %anomaly.anomaly_type,
                error = %e,
                "Explainer failed, using template explanation"
            );
            TemplateExplainer
                .explain(service_name, anomaly)
                .await
                .unwrap_or_else(|_| anomaly.anomaly_type.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anomaly::detect::Severity;

    fn sample_anomaly() -> DetectedAnomaly {
        DetectedAnomaly {
            anomaly_type: "latency_spike".to_string(),
            category: "performance",
            severity: Severity::Critical,
            confidence: 95.0,
            baseline: 200.0,
            observed: 2500.0,
            deviation_pct: 1150.0,
            detection_method: "threshold",
            recommended_actions: vec![],
            explanation: None,
        }
    }

    #[tokio::test]
    async fn test_template_explainer_mentions_key_figures() {
        let text = TemplateExplainer
            .explain("slack", &sample_anomaly())
            .await
            .unwrap();
        assert!(text.contains("latency_spike"));
        assert!(text.contains("slack"));
        assert!(text.contains("2500.0"));
        assert!(text.contains("critical"));
    }

    #[tokio::test]
    async fn test_fallback_on_explainer_failure() {
        struct FailingExplainer;

        #[async_trait]
        impl Explainer for FailingExplainer {
            async fn explain(
                &self,
                _service_name: &str,
                _anomaly: &DetectedAnomaly,
            ) -> Result<String, ExplainError> {
                Err(ExplainError::Empty)
            }
        }

        let text = explain_or_fallback(&FailingExplainer, "slack", &sample_anomaly()).await;
        assert!(text.contains("latency_spike"));
    }

    #[test]
    fn test_build_explainer_defaults_to_template() {
        let explainer = build_explainer(&ExplainerConfig::default());
        // Template path produces text without any network configuration
        let anomaly = sample_anomaly();
        let text = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(explainer.explain("svc", &anomaly))
            .unwrap();
        assert!(!text.is_empty());
    }
}
