//! Estadísticas jerárquicas: `FlowStats` agrega `StepStats`.
//!
//! El trait `Stats` es la base común: identidad, consultas de contadores,
//! captura de detalle y las operaciones `mark_*` del ciclo de vida. Las
//! operaciones `mark_*` son métodos provistos: la lógica de transición vive
//! aquí y cada implementación sólo aporta su `snapshot` (identidad propia).

mod counters;
mod detail;
mod flow;
mod step;

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

pub use counters::{CounterKey, CounterSample, CounterSet, StepCounter};
pub use detail::{DetailError, DetailSource};
pub use flow::{CaptureReport, FlowIdentity, FlowStats};
pub use step::StepStats;

use crate::errors::{LifecycleError, StatsError};
use crate::lifecycle::{FailureCause, Lifecycle, LifecycleState, Status, Transition};
use crate::sink::{ClientSnapshot, ClientState};

pub trait Stats: Send + Sync {
    /// Identificador opaco asignado por la aplicación.
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    fn lifecycle(&self) -> &Lifecycle;
    fn client_state(&self) -> &dyn ClientState;
    /// Snapshot de `state` con la identidad propia. `mark` le pasa el estado
    /// confirmado por la transición, no una relectura.
    fn snapshot(&self, state: &LifecycleState) -> ClientSnapshot;

    fn counter_groups(&self) -> HashSet<String>;
    fn counter_groups_matching_regex(&self, pattern: &Regex) -> HashSet<String>;
    fn counters_for(&self, group: &str) -> HashSet<String>;
    /// Valor del contador; 0 si nunca se reportó.
    fn counter_value_of(&self, group: &str, counter: &str) -> i64;

    /// Materializa detalle diferido (p.ej. contadores remotos). Puede hacer I/O.
    fn capture_detail(&self) -> Result<(), StatsError>;

    /// Hijos para recorrido jerárquico genérico.
    fn children(&self) -> Vec<Arc<dyn Stats>>;

    fn counter_value(&self, key: &dyn CounterKey) -> i64 {
        self.counter_value_of(key.group(), key.name())
    }

    fn counter_groups_matching(&self, pattern: &str) -> Result<HashSet<String>, StatsError> {
        let re = Regex::new(pattern).map_err(|e| StatsError::InvalidPattern { pattern: pattern.to_string(),
                                                                                reason: e.to_string() })?;
        Ok(self.counter_groups_matching_regex(&re))
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle().state()
    }

    fn status(&self) -> Status {
        self.lifecycle().status()
    }

    fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    fn stats_string(&self) -> String {
        format!("status={}, name={}", self.status(), self.name())
    }

    fn mark_pending(&self) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Pending)
    }

    fn mark_running(&self) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Running)
    }

    fn mark_successful(&self) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Successful)
    }

    fn mark_skipped(&self) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Skipped)
    }

    fn mark_stopped(&self) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Stopped)
    }

    fn mark_failed(&self, cause: FailureCause) -> Result<Transition, LifecycleError> {
        self.mark(LifecycleState::Failed(cause))
    }

    /// Aplica la transición y, si se aplicó, registra un único snapshot.
    fn mark(&self, target: LifecycleState) -> Result<Transition, LifecycleError> {
        let (transition, committed) = self.lifecycle().commit(target, self.id())?;
        if transition.is_applied() {
            self.client_state().record(self.snapshot(&committed));
        }
        Ok(transition)
    }
}
