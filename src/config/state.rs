// Application state module
// Read-only per-process state shared by every connection

use super::types::Config;
use crate::gate::{GateError, StaticAssetGate};

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub gate: StaticAssetGate,
    pub access_log: bool,
}

impl AppState {
    /// Build the gate from configuration
    ///
    /// Fails when root confinement is on and the document root cannot be canonicalized.
    pub fn new(config: &Config) -> Result<Self, GateError> {
        let gate = StaticAssetGate::from_config(&config.gate)?;
        Ok(Self {
            config: config.clone(),
            gate,
            access_log: config.logging.access_log,
        })
    }
}
