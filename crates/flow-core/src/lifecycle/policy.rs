//! Tabla de transiciones y política ante transiciones ilegales.
//!
//! Transiciones válidas:
//! - `Pending` -> `Pending` (re-anuncio; se registra igualmente)
//! - `Pending` -> `Running` | `Skipped` | `Stopped` | `Failed`
//! - `Running` -> `Successful` | `Skipped` | `Stopped` | `Failed`
//!
//! Cualquier otra (incluida toda salida desde un terminal) es ilegal.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Status;

/// Qué hacer ante una transición ilegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Rechaza con `LifecycleError::IllegalTransition`.
    #[default]
    Strict,
    /// No-op con diagnóstico `warn`.
    Lenient,
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "lenient" => Ok(TransitionPolicy::Lenient),
            other => Err(format!("unknown transition policy '{other}'")),
        }
    }
}

/// Resultado de una transición aceptada por la máquina.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// El estado cambió (o se re-anunció `Pending`) y se debe registrar.
    Applied { from: Status, to: Status },
    /// Transición ilegal ignorada bajo `TransitionPolicy::Lenient`.
    Ignored { from: Status, to: Status },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

pub fn is_allowed(from: Status, to: Status) -> bool {
    use Status::*;
    match (from, to) {
        (Pending, Pending | Running | Skipped | Stopped | Failed) => true,
        (Running, Successful | Skipped | Stopped | Failed) => true,
        _ => false,
    }
}
