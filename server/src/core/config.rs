use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HISTORY_LIMIT, DEFAULT_HOST, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PORT, DEFAULT_SCHEDULER_INTERVAL_SECS, DEFAULT_UNIT_TIMEOUT_SECS, DEFAULT_WINDOW_DAYS,
    EXPLAINER_MAX_PER_UNIT, EXPLAINER_TIMEOUT_SECS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fusion scoring configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FusionFileConfig {
    pub window_days: Option<i64>,
    pub history_limit: Option<u32>,
    pub variance_coefficient: Option<f64>,
    pub confidence_coefficient: Option<f64>,
    pub correlation_coefficient: Option<f64>,
    pub trend_threshold_pct: Option<f64>,
    pub forecast_weights: Option<Vec<f64>>,
    pub range_overrides: Option<HashMap<String, (f64, f64)>>,
}

/// Anomaly detection configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnomalyFileConfig {
    pub latency_flag_ms: Option<f64>,
    pub latency_high_ms: Option<f64>,
    pub latency_critical_ms: Option<f64>,
    pub latency_flag_pct: Option<f64>,
    pub latency_high_pct: Option<f64>,
    pub latency_critical_pct: Option<f64>,
    pub error_rate_flag: Option<f64>,
    pub error_rate_high: Option<f64>,
    pub error_rate_critical: Option<f64>,
    pub error_rate_flag_pct: Option<f64>,
    pub error_rate_high_pct: Option<f64>,
    pub error_rate_critical_pct: Option<f64>,
    pub cpu_high: Option<f64>,
    pub cpu_critical: Option<f64>,
    pub memory_high: Option<f64>,
    pub memory_critical: Option<f64>,
    pub z_score_threshold: Option<f64>,
    pub max_explained: Option<usize>,
}

/// Batch orchestration configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrchestratorFileConfig {
    pub unit_timeout_secs: Option<u64>,
    pub max_concurrency: Option<usize>,
}

/// External anomaly explainer configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExplainerFileConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Scheduled recalibration configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SchedulerFileConfig {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub fusion: Option<FusionFileConfig>,
    pub anomaly: Option<AnomalyFileConfig>,
    pub orchestrator: Option<OrchestratorFileConfig>,
    pub explainer: Option<ExplainerFileConfig>,
    pub scheduler: Option<SchedulerFileConfig>,
    pub data_dir: Option<String>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }

        // Fusion
        if let Some(fusion) = other.fusion {
            let current = self.fusion.get_or_insert_with(FusionFileConfig::default);
            if fusion.window_days.is_some() {
                current.window_days = fusion.window_days;
            }
            if fusion.history_limit.is_some() {
                current.history_limit = fusion.history_limit;
            }
            if fusion.variance_coefficient.is_some() {
                current.variance_coefficient = fusion.variance_coefficient;
            }
            if fusion.confidence_coefficient.is_some() {
                current.confidence_coefficient = fusion.confidence_coefficient;
            }
            if fusion.correlation_coefficient.is_some() {
                current.correlation_coefficient = fusion.correlation_coefficient;
            }
            if fusion.trend_threshold_pct.is_some() {
                current.trend_threshold_pct = fusion.trend_threshold_pct;
            }
            if fusion.forecast_weights.is_some() {
                current.forecast_weights = fusion.forecast_weights;
            }
            if let Some(overrides) = fusion.range_overrides {
                current
                    .range_overrides
                    .get_or_insert_with(HashMap::new)
                    .extend(overrides);
            }
        }

        // Anomaly
        if let Some(anomaly) = other.anomaly {
            let current = self.anomaly.get_or_insert_with(AnomalyFileConfig::default);
            macro_rules! take {
                ($field:ident) => {
                    if anomaly.$field.is_some() {
                        current.$field = anomaly.$field;
                    }
                };
            }
            take!(latency_flag_ms);
            take!(latency_high_ms);
            take!(latency_critical_ms);
            take!(latency_flag_pct);
            take!(latency_high_pct);
            take!(latency_critical_pct);
            take!(error_rate_flag);
            take!(error_rate_high);
            take!(error_rate_critical);
            take!(error_rate_flag_pct);
            take!(error_rate_high_pct);
            take!(error_rate_critical_pct);
            take!(cpu_high);
            take!(cpu_critical);
            take!(memory_high);
            take!(memory_critical);
            take!(z_score_threshold);
            take!(max_explained);
        }

        // Orchestrator
        if let Some(orchestrator) = other.orchestrator {
            let current = self
                .orchestrator
                .get_or_insert_with(OrchestratorFileConfig::default);
            if orchestrator.unit_timeout_secs.is_some() {
                current.unit_timeout_secs = orchestrator.unit_timeout_secs;
            }
            if orchestrator.max_concurrency.is_some() {
                current.max_concurrency = orchestrator.max_concurrency;
            }
        }

        // Explainer
        if let Some(explainer) = other.explainer {
            let current = self
                .explainer
                .get_or_insert_with(ExplainerFileConfig::default);
            if explainer.enabled.is_some() {
                current.enabled = explainer.enabled;
            }
            if explainer.url.is_some() {
                current.url = explainer.url;
            }
            if explainer.timeout_secs.is_some() {
                current.timeout_secs = explainer.timeout_secs;
            }
        }

        // Scheduler
        if let Some(scheduler) = other.scheduler {
            let current = self
                .scheduler
                .get_or_insert_with(SchedulerFileConfig::default);
            if scheduler.enabled.is_some() {
                current.enabled = scheduler.enabled;
            }
            if scheduler.interval_secs.is_some() {
                current.interval_secs = scheduler.interval_secs;
            }
        }

        // Data dir
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }

        // Debug
        if other.debug.is_some() {
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Fusion scoring configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Extraction window in days
    pub window_days: i64,
    /// Maximum history points loaded per series
    pub history_limit: u32,
    /// Weighting adjustment coefficient for variance
    pub variance_coefficient: f64,
    /// Weighting adjustment coefficient for confidence
    pub confidence_coefficient: f64,
    /// Weighting adjustment coefficient for the correlation penalty
    pub correlation_coefficient: f64,
    /// Percentage change beyond which a trend is up/down instead of stable
    pub trend_threshold_pct: f64,
    /// Forecast weights, most recent point first
    pub forecast_weights: Vec<f64>,
    /// Per-category normalization range overrides, keyed
    /// "category.dimension" (e.g. "communication.activity") with
    /// [min, max] values. Categories keep their built-in ranges unless
    /// overridden here.
    pub range_overrides: HashMap<String, (f64, f64)>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            variance_coefficient: 0.3,
            confidence_coefficient: 0.5,
            correlation_coefficient: 0.2,
            trend_threshold_pct: 5.0,
            forecast_weights: vec![0.4, 0.3, 0.2, 0.1],
            range_overrides: HashMap::new(),
        }
    }
}

/// Anomaly detection thresholds (final/runtime)
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Latency flagged when observed exceeds this OR deviation exceeds flag_pct
    pub latency_flag_ms: f64,
    pub latency_high_ms: f64,
    pub latency_critical_ms: f64,
    pub latency_flag_pct: f64,
    pub latency_high_pct: f64,
    pub latency_critical_pct: f64,
    /// Error rate flagged when observed exceeds this OR deviation exceeds flag_pct
    pub error_rate_flag: f64,
    pub error_rate_high: f64,
    pub error_rate_critical: f64,
    pub error_rate_flag_pct: f64,
    pub error_rate_high_pct: f64,
    pub error_rate_critical_pct: f64,
    /// CPU saturation thresholds (percent)
    pub cpu_high: f64,
    pub cpu_critical: f64,
    /// Memory saturation thresholds (percent)
    pub memory_high: f64,
    pub memory_critical: f64,
    /// Absolute z-score beyond which a metric is statistically anomalous
    pub z_score_threshold: f64,
    /// Maximum anomalies per unit sent to the external explainer
    pub max_explained: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            latency_flag_ms: 2000.0,
            latency_high_ms: 3000.0,
            latency_critical_ms: 5000.0,
            latency_flag_pct: 100.0,
            latency_high_pct: 200.0,
            latency_critical_pct: 300.0,
            error_rate_flag: 5.0,
            error_rate_high: 10.0,
            error_rate_critical: 20.0,
            error_rate_flag_pct: 100.0,
            error_rate_high_pct: 300.0,
            error_rate_critical_pct: 500.0,
            cpu_high: 80.0,
            cpu_critical: 95.0,
            memory_high: 85.0,
            memory_critical: 95.0,
            z_score_threshold: 2.0,
            max_explained: EXPLAINER_MAX_PER_UNIT,
        }
    }
}

/// Batch orchestration configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Per-unit processing timeout in seconds
    pub unit_timeout_secs: u64,
    /// Maximum units processed concurrently
    pub max_concurrency: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            unit_timeout_secs: DEFAULT_UNIT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// External anomaly explainer configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            timeout_secs: EXPLAINER_TIMEOUT_SECS,
        }
    }
}

/// Scheduled recalibration configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SCHEDULER_INTERVAL_SECS,
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fusion: FusionConfig,
    pub anomaly: AnomalyConfig,
    pub orchestrator: OrchestratorConfig,
    pub explainer: ExplainerConfig,
    pub scheduler: SchedulerConfig,
    pub data_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            fusion: FusionConfig::default(),
            anomaly: AnomalyConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            explainer: ExplainerConfig::default(),
            scheduler: SchedulerConfig::default(),
            data_dir: None,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.workfuse/workfuse.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.workfuse/workfuse.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Extract file config values with defaults
        let file_server = file_config.server.unwrap_or_default();
        let file_fusion = file_config.fusion.unwrap_or_default();
        let file_anomaly = file_config.anomaly.unwrap_or_default();
        let file_orchestrator = file_config.orchestrator.unwrap_or_default();
        let file_explainer = file_config.explainer.unwrap_or_default();
        let file_scheduler = file_config.scheduler.unwrap_or_default();

        // 4. Layer configs: defaults -> file config -> CLI/env overrides
        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let debug = cli.debug || file_config.debug.unwrap_or(false);

        let fusion_defaults = FusionConfig::default();
        let fusion = FusionConfig {
            window_days: file_fusion.window_days.unwrap_or(fusion_defaults.window_days),
            history_limit: file_fusion
                .history_limit
                .unwrap_or(fusion_defaults.history_limit),
            variance_coefficient: file_fusion
                .variance_coefficient
                .unwrap_or(fusion_defaults.variance_coefficient),
            confidence_coefficient: file_fusion
                .confidence_coefficient
                .unwrap_or(fusion_defaults.confidence_coefficient),
            correlation_coefficient: file_fusion
                .correlation_coefficient
                .unwrap_or(fusion_defaults.correlation_coefficient),
            trend_threshold_pct: file_fusion
                .trend_threshold_pct
                .unwrap_or(fusion_defaults.trend_threshold_pct),
            forecast_weights: file_fusion
                .forecast_weights
                .unwrap_or(fusion_defaults.forecast_weights),
            range_overrides: file_fusion.range_overrides.unwrap_or_default(),
        };

        let anomaly_defaults = AnomalyConfig::default();
        let anomaly = AnomalyConfig {
            latency_flag_ms: file_anomaly
                .latency_flag_ms
                .unwrap_or(anomaly_defaults.latency_flag_ms),
            latency_high_ms: file_anomaly
                .latency_high_ms
                .unwrap_or(anomaly_defaults.latency_high_ms),
            latency_critical_ms: file_anomaly
                .latency_critical_ms
                .unwrap_or(anomaly_defaults.latency_critical_ms),
            latency_flag_pct: file_anomaly
                .latency_flag_pct
                .unwrap_or(anomaly_defaults.latency_flag_pct),
            latency_high_pct: file_anomaly
                .latency_high_pct
                .unwrap_or(anomaly_defaults.latency_high_pct),
            latency_critical_pct: file_anomaly
                .latency_critical_pct
                .unwrap_or(anomaly_defaults.latency_critical_pct),
            error_rate_flag: file_anomaly
                .error_rate_flag
                .unwrap_or(anomaly_defaults.error_rate_flag),
            error_rate_high: file_anomaly
                .error_rate_high
                .unwrap_or(anomaly_defaults.error_rate_high),
            error_rate_critical: file_anomaly
                .error_rate_critical
                .unwrap_or(anomaly_defaults.error_rate_critical),
            error_rate_flag_pct: file_anomaly
                .error_rate_flag_pct
                .unwrap_or(anomaly_defaults.error_rate_flag_pct),
            error_rate_high_pct: file_anomaly
                .error_rate_high_pct
                .unwrap_or(anomaly_defaults.error_rate_high_pct),
            error_rate_critical_pct: file_anomaly
                .error_rate_critical_pct
                .unwrap_or(anomaly_defaults.error_rate_critical_pct),
            cpu_high: file_anomaly.cpu_high.unwrap_or(anomaly_defaults.cpu_high),
            cpu_critical: file_anomaly
                .cpu_critical
                .unwrap_or(anomaly_defaults.cpu_critical),
            memory_high: file_anomaly
                .memory_high
                .unwrap_or(anomaly_defaults.memory_high),
            memory_critical: file_anomaly
                .memory_critical
                .unwrap_or(anomaly_defaults.memory_critical),
            z_score_threshold: file_anomaly
                .z_score_threshold
                .unwrap_or(anomaly_defaults.z_score_threshold),
            max_explained: file_anomaly
                .max_explained
                .unwrap_or(anomaly_defaults.max_explained),
        };

        let orchestrator_defaults = OrchestratorConfig::default();
        let orchestrator = OrchestratorConfig {
            unit_timeout_secs: file_orchestrator
                .unit_timeout_secs
                .unwrap_or(orchestrator_defaults.unit_timeout_secs),
            max_concurrency: file_orchestrator
                .max_concurrency
                .unwrap_or(orchestrator_defaults.max_concurrency),
        };

        // explainer: CLI/env URL both enables and configures it
        let explainer_defaults = ExplainerConfig::default();
        let explainer_url = cli.explainer_url.clone().or(file_explainer.url);
        let explainer = ExplainerConfig {
            enabled: file_explainer
                .enabled
                .unwrap_or(explainer_url.is_some()),
            url: explainer_url,
            timeout_secs: file_explainer
                .timeout_secs
                .unwrap_or(explainer_defaults.timeout_secs),
        };

        // scheduler: --no-scheduler CLI flag wins over file config
        let scheduler_defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            enabled: if cli.no_scheduler {
                false
            } else {
                file_scheduler.enabled.unwrap_or(scheduler_defaults.enabled)
            },
            interval_secs: cli
                .scheduler_interval
                .or(file_scheduler.interval_secs)
                .unwrap_or(scheduler_defaults.interval_secs),
        };

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file_config.data_dir.as_deref().map(expand_path));

        let config = Self {
            server: ServerConfig { host, port },
            fusion,
            anomaly,
            orchestrator,
            explainer,
            scheduler,
            data_dir,
            debug,
        };

        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            debug = config.debug,
            window_days = config.fusion.window_days,
            history_limit = config.fusion.history_limit,
            unit_timeout_secs = config.orchestrator.unit_timeout_secs,
            max_concurrency = config.orchestrator.max_concurrency,
            explainer_enabled = config.explainer.enabled,
            scheduler_enabled = config.scheduler.enabled,
            scheduler_interval_secs = config.scheduler.interval_secs,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.fusion.window_days < 1 {
            anyhow::bail!("Configuration error: fusion.window_days must be at least 1");
        }
        if self.fusion.forecast_weights.is_empty() {
            anyhow::bail!("Configuration error: fusion.forecast_weights must not be empty");
        }
        if self
            .fusion
            .forecast_weights
            .iter()
            .any(|w| !w.is_finite() || *w <= 0.0)
        {
            anyhow::bail!("Configuration error: fusion.forecast_weights must be positive");
        }
        for (key, (min, max)) in &self.fusion.range_overrides {
            if !min.is_finite() || !max.is_finite() || min >= max {
                anyhow::bail!(
                    "Configuration error: fusion.range_overrides[{}] must have min < max",
                    key
                );
            }
        }
        if self.orchestrator.unit_timeout_secs == 0 {
            anyhow::bail!("Configuration error: orchestrator.unit_timeout_secs must be at least 1");
        }
        if self.orchestrator.max_concurrency == 0 {
            anyhow::bail!("Configuration error: orchestrator.max_concurrency must be at least 1");
        }
        if self.explainer.enabled && self.explainer.url.is_none() {
            anyhow::bail!("Configuration error: explainer.url is required when explainer.enabled");
        }
        if self.scheduler.enabled && self.scheduler.interval_secs == 0 {
            anyhow::bail!("Configuration error: scheduler.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Whether the server binds all interfaces (affects CORS origins)
    pub fn is_all_interfaces(&self) -> bool {
        matches!(self.server.host.as_str(), "0.0.0.0" | "::" | "[::]")
    }
}

/// Path to the profile config file (~/.workfuse/workfuse.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
