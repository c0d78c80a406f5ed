//! Errores específicos del core de estadísticas.

use thiserror::Error;

use crate::lifecycle::Status;

/// Error de transición de ciclo de vida (política estricta).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LifecycleError {
    #[error("illegal lifecycle transition: {from} -> {to}")]
    IllegalTransition { from: Status, to: Status },
}

/// Errores de consulta/captura sobre estadísticas de flow y step.
#[derive(Debug, Error, Clone)]
pub enum StatsError {
    #[error("invalid counter group pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("detail capture failed for step '{step_id}': {reason}")]
    DetailCapture { step_id: String, reason: String },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
