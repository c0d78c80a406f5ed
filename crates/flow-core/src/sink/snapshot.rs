//! Snapshots enviados al sink en cada transición de ciclo de vida.
//!
//! Rol en el flujo:
//! - Cada transición aceptada de un `FlowStats` o `StepStats` produce
//!   exactamente un `ClientSnapshot`.
//! - El sink es dueño de la persistencia/transporte; el core no consume
//!   ningún valor de retorno.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Status;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientSnapshot {
    Flow(FlowSnapshot),
    Step(StepSnapshot),
}

impl ClientSnapshot {
    pub fn status(&self) -> Status {
        match self {
            ClientSnapshot::Flow(f) => f.status,
            ClientSnapshot::Step(s) => s.status,
        }
    }

    /// Flow al que pertenece el snapshot (el propio o el dueño del step).
    pub fn flow_id(&self) -> &str {
        match self {
            ClientSnapshot::Flow(f) => &f.flow_id,
            ClientSnapshot::Step(s) => &s.flow_id,
        }
    }

    pub fn as_flow(&self) -> Option<&FlowSnapshot> {
        match self {
            ClientSnapshot::Flow(f) => Some(f),
            ClientSnapshot::Step(_) => None,
        }
    }
}

/// Identidad del Flow + estado actual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub flow_id: String,
    pub flow_name: String,
    pub status: Status,
    pub failure: Option<String>,
    pub steps_count: usize,
    pub recorded_at: DateTime<Utc>, // metadato (no identifica)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub flow_id: String,
    pub step_id: String,
    pub step_name: String,
    pub status: Status,
    pub failure: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
