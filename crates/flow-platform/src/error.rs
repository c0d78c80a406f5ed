//! Errores de la capa de plataforma (configuración, sinks con I/O, harness).

use std::path::PathBuf;

use flow_core::StatsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid config {key}='{value}': {reason}")]
    InvalidConfig { key: String, value: String, reason: String },
    #[error("cluster harness not set up")]
    NotStarted,
    #[error("snapshot sink closed")]
    SinkClosed,
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
}
