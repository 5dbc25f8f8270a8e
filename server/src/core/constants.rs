// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "WorkFuse";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "workfuse";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".workfuse";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "workfuse.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "WORKFUSE_CONFIG";

// =============================================================================
// Environment Variables - Debug
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "WORKFUSE_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "WORKFUSE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "WORKFUSE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "WORKFUSE_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5480;

// =============================================================================
// Environment Variables - Storage
// =============================================================================

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "WORKFUSE_DATA_DIR";

// =============================================================================
// Environment Variables - Scheduler
// =============================================================================

/// Environment variable to disable the scheduled recalibration loop
pub const ENV_NO_SCHEDULER: &str = "WORKFUSE_NO_SCHEDULER";

/// Environment variable for scheduler interval in seconds
pub const ENV_SCHEDULER_INTERVAL_SECS: &str = "WORKFUSE_SCHEDULER_INTERVAL_SECS";

// =============================================================================
// Environment Variables - Explainer
// =============================================================================

/// Environment variable for the external anomaly explainer URL
pub const ENV_EXPLAINER_URL: &str = "WORKFUSE_EXPLAINER_URL";

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "workfuse.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// WAL checkpoint interval in seconds (5 minutes)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// Request Body Limits
// =============================================================================

/// Default body limit for general API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Body limit for event ingestion (16 MB - batched integration payloads)
pub const EVENTS_BODY_LIMIT: usize = 16 * 1024 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Scoring Pipeline
// =============================================================================

/// Metric extraction/scoring window in days
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Maximum history points loaded per metric or score series
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;

/// Per-unit processing timeout in seconds
pub const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 8;

/// Maximum units processed concurrently in a batch run
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Scheduled recalibration interval in seconds (15 minutes)
pub const DEFAULT_SCHEDULER_INTERVAL_SECS: u64 = 900;

/// Snapshots older than this are reported as stale (24 hours)
pub const SNAPSHOT_FRESH_SECS: i64 = 86_400;

// =============================================================================
// Anomaly Explainer
// =============================================================================

/// Explainer HTTP timeout in seconds
pub const EXPLAINER_TIMEOUT_SECS: u64 = 5;

/// Maximum anomalies per unit sent to the explainer
pub const EXPLAINER_MAX_PER_UNIT: usize = 3;

// =============================================================================
// Query Limits
// =============================================================================

/// Default number of anomalies returned per query
pub const QUERY_DEFAULT_ANOMALY_LIMIT: u32 = 50;

/// Maximum number of anomalies returned per query
pub const QUERY_MAX_ANOMALY_LIMIT: u32 = 500;

// =============================================================================
// Ingestion Limits
// =============================================================================

/// Maximum events accepted per ingestion request
pub const MAX_EVENTS_PER_BATCH: usize = 5000;
