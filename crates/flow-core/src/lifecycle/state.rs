//! Estado de ciclo de vida de un objeto de estadísticas (Flow o Step).
//!
//! `LifecycleState` es la variante etiquetada completa (incluye la causa de
//! fallo); `Status` es su discriminante sin datos, usado en snapshots,
//! errores y en la tabla de transiciones.
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Discriminante serializable del estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Running,
    Successful,
    Skipped,
    Stopped,
    Failed,
}

impl Status {
    /// Los estados terminales son absorbentes.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Successful | Status::Skipped | Status::Stopped | Status::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Running => "RUNNING",
            Status::Successful => "SUCCESSFUL",
            Status::Skipped => "SKIPPED",
            Status::Stopped => "STOPPED",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Causa opaca adjunta a `Failed`. El core no la interpreta ni la relanza;
/// sólo la conserva como diagnóstico.
#[derive(Clone)]
pub struct FailureCause(Arc<dyn StdError + Send + Sync>);

impl FailureCause {
    pub fn new<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Self(Arc::new(error))
    }

    /// Causa construida a partir de un mensaje plano.
    pub fn from_message(message: impl Into<String>) -> Self {
        let boxed: Box<dyn StdError + Send + Sync> = message.into().into();
        Self(Arc::from(boxed))
    }

    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FailureCause").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Estado completo: `Pending → Running → {Successful | Skipped | Stopped | Failed}`.
#[derive(Debug, Clone)]
pub enum LifecycleState {
    Pending,
    Running,
    Successful,
    Skipped,
    Stopped,
    Failed(FailureCause),
}

impl LifecycleState {
    pub fn status(&self) -> Status {
        match self {
            LifecycleState::Pending => Status::Pending,
            LifecycleState::Running => Status::Running,
            LifecycleState::Successful => Status::Successful,
            LifecycleState::Skipped => Status::Skipped,
            LifecycleState::Stopped => Status::Stopped,
            LifecycleState::Failed(_) => Status::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Causa de fallo si el estado es `Failed`.
    pub fn failure(&self) -> Option<&FailureCause> {
        match self {
            LifecycleState::Failed(cause) => Some(cause),
            _ => None,
        }
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Pending
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Failed(cause) => write!(f, "{} ({})", Status::Failed, cause),
            other => fmt::Display::fmt(&other.status(), f),
        }
    }
}
