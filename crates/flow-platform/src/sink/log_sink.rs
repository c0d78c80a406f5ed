use flow_core::{ClientSnapshot, ClientState};
use log::{error, info};

/// Sink que registra cada snapshot en el log (target configurable).
#[derive(Debug, Clone)]
pub struct LogClientState {
    target: String,
}

impl LogClientState {
    pub fn new() -> Self {
        Self { target: "flowstats::client_state".to_string() }
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogClientState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientState for LogClientState {
    fn record(&self, snapshot: ClientSnapshot) {
        match serde_json::to_string(&snapshot) {
            Ok(json) => info!(target: self.target.as_str(), "{json}"),
            Err(e) => error!(target: self.target.as_str(), "cannot serialize snapshot for flow {}: {e}", snapshot.flow_id()),
        }
    }
}
