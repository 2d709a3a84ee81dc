// Configuration module entry point
// Loads the layered configuration and holds the per-process application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, DetectorKind, FallbackConfig, GateConfig, LoggingConfig, PerformanceConfig,
    ScriptPolicy, ServerConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The file is optional; environment and defaults fill the rest
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, Self::environment())
    }

    /// `SERVER_`-prefixed variables, `__` between section and key.
    /// List keys take comma-separated values (`SERVER_GATE__SCRIPT_EXTENSIONS=php,cgi`)
    fn environment() -> config::Environment {
        config::Environment::with_prefix("SERVER")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("gate.script_extensions")
            .with_list_parse_key("fallback.index_files")
    }

    fn load_with(
        config_path: &str,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(environment)
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("gate.document_root", ".")?
            .set_default("gate.script_extensions", vec!["php"])?
            .set_default("gate.confine_to_root", true)?
            .set_default("gate.mime_detector", "sniff")?
            .set_default("fallback.index_files", vec!["index.html", "index.htm"])?
            .set_default("fallback.script_policy", "forbidden")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `config.toml` in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Reject values serde accepts but the gate cannot use
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.gate.document_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "gate.document_root must not be empty".to_string(),
            ));
        }
        for ext in &self.gate.script_extensions {
            let bare = ext.trim_start_matches('.');
            if bare.is_empty() || bare.contains(['.', '/']) {
                return Err(config::ConfigError::Message(format!(
                    "invalid script extension '{ext}'"
                )));
            }
        }
        if self.fallback.index_files.iter().any(|f| f.is_empty() || f.contains('/')) {
            return Err(config::ConfigError::Message(
                "fallback.index_files entries must be plain file names".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn is_debug(&self) -> bool {
        self.logging.level.eq_ignore_ascii_case("debug")
    }
}
