// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Static asset gate configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// Directory request paths are resolved under
    pub document_root: String,
    /// Extensions declined as host-executed scripts (no leading dot)
    #[serde(default = "default_script_extensions")]
    pub script_extensions: Vec<String>,
    /// Canonicalize resolved paths and refuse anything outside the root
    #[serde(default = "default_confine_to_root")]
    pub confine_to_root: bool,
    #[serde(default)]
    pub mime_detector: DetectorKind,
}

#[allow(clippy::missing_const_for_fn)]
fn default_script_extensions() -> Vec<String> {
    vec!["php".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_confine_to_root() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            document_root: ".".to_string(),
            script_extensions: default_script_extensions(),
            confine_to_root: default_confine_to_root(),
            mime_detector: DetectorKind::default(),
        }
    }
}

/// Content-type detection strategy
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Inspect leading bytes of the file
    #[default]
    Sniff,
    /// Map the file extension
    Extension,
}

/// Host handling for requests the gate declines
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Tried in order when a declined path is a directory
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    #[serde(default)]
    pub script_policy: ScriptPolicy,
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            index_files: default_index_files(),
            script_policy: ScriptPolicy::default(),
        }
    }
}

/// Response for declined script paths; this host has no script runtime
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPolicy {
    /// 403 Forbidden
    #[default]
    Forbidden,
    /// 404 Not Found, hiding that the script exists
    NotFound,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        }
    }
}
