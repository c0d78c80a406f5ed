//! Estadísticas de un Flow: agrega los contadores de todos sus steps.
//!
//! Todas las agregaciones son recorridos completos O(steps × contadores) en el
//! momento de la consulta; no se mantiene ningún agregado incremental. La
//! lista de steps vive tras un `RwLock`: `add_step_stats` toma el lock de
//! escritura y cada recorrido el de lectura, así ninguna consulta observa
//! una lista a medio insertar.
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use log::{debug, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Stats, StepStats};
use crate::errors::StatsError;
use crate::lifecycle::{Lifecycle, LifecycleState, TransitionPolicy};
use crate::sink::{ClientSnapshot, ClientState, FlowSnapshot};

/// Identidad inmutable del Flow dueño de las estadísticas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowIdentity {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub flow_id: String,
    pub flow_name: String,
}

impl FlowIdentity {
    /// Identidad con un `flow_id` nuevo (uuid v4 en forma simple).
    pub fn generate(app_id: impl Into<String>,
                    app_name: impl Into<String>,
                    app_version: impl Into<String>,
                    flow_name: impl Into<String>)
                    -> Self {
        Self { app_id: app_id.into(),
               app_name: app_name.into(),
               app_version: app_version.into(),
               flow_id: Uuid::new_v4().simple().to_string(),
               flow_name: flow_name.into() }
    }
}

/// Resultado de una pasada de captura de detalle.
#[derive(Debug, Default)]
pub struct CaptureReport {
    /// Steps capturados correctamente, en orden de registro.
    pub captured: Vec<String>,
    pub failures: Vec<(String, StatsError)>,
}

impl CaptureReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct FlowStats {
    identity: FlowIdentity,
    lifecycle: Lifecycle,
    client_state: Arc<dyn ClientState>,
    steps: RwLock<Vec<Arc<StepStats>>>,
}

impl FlowStats {
    pub fn new(identity: FlowIdentity, client_state: Arc<dyn ClientState>) -> Self {
        Self::with_policy(identity, client_state, TransitionPolicy::default())
    }

    pub fn with_policy(identity: FlowIdentity, client_state: Arc<dyn ClientState>, policy: TransitionPolicy) -> Self {
        Self { identity,
               lifecycle: Lifecycle::new(policy),
               client_state,
               steps: RwLock::new(Vec::new()) }
    }

    pub fn identity(&self) -> &FlowIdentity {
        &self.identity
    }

    pub fn app_id(&self) -> &str {
        &self.identity.app_id
    }

    pub fn app_name(&self) -> &str {
        &self.identity.app_name
    }

    pub fn app_version(&self) -> &str {
        &self.identity.app_version
    }

    /// Agrega un step al final. Sin deduplicación ni límite.
    pub fn add_step_stats(&self, step: Arc<StepStats>) {
        let mut steps = self.steps.write().unwrap_or_else(|p| p.into_inner());
        debug!("flow {}: registering step {}", self.identity.flow_id, step.id());
        steps.push(step);
    }

    /// Copia de la secuencia ordenada de steps (la lista interna no se expone).
    pub fn step_stats(&self) -> Vec<Arc<StepStats>> {
        self.read_steps().clone()
    }

    pub fn steps_count(&self) -> usize {
        self.read_steps().len()
    }

    /// Captura el detalle de cada step de forma independiente. Un fallo en un
    /// step se registra y no impide capturar los demás.
    pub fn capture_detail_report(&self) -> CaptureReport {
        let steps = self.step_stats();
        let results: Vec<(String, Result<(), StatsError>)> =
            steps.par_iter()
                 .map(|s| (s.id().to_string(), s.capture_detail()))
                 .collect();

        let mut report = CaptureReport::default();
        for (step_id, res) in results {
            match res {
                Ok(()) => report.captured.push(step_id),
                Err(e) => {
                    warn!("flow {}: {e}", self.identity.flow_id);
                    report.failures.push((step_id, e));
                }
            }
        }
        report
    }

    fn read_steps(&self) -> RwLockReadGuard<'_, Vec<Arc<StepStats>>> {
        self.steps.read().unwrap_or_else(|p| p.into_inner())
    }
}

impl Stats for FlowStats {
    fn id(&self) -> &str {
        &self.identity.flow_id
    }

    fn name(&self) -> &str {
        &self.identity.flow_name
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn client_state(&self) -> &dyn ClientState {
        self.client_state.as_ref()
    }

    fn snapshot(&self, state: &LifecycleState) -> ClientSnapshot {
        let id = &self.identity;
        ClientSnapshot::Flow(FlowSnapshot { app_id: id.app_id.clone(),
                                            app_name: id.app_name.clone(),
                                            app_version: id.app_version.clone(),
                                            flow_id: id.flow_id.clone(),
                                            flow_name: id.flow_name.clone(),
                                            status: state.status(),
                                            failure: state.failure().map(|c| c.to_string()),
                                            steps_count: self.steps_count(),
                                            recorded_at: Utc::now() })
    }

    fn counter_groups(&self) -> HashSet<String> {
        self.read_steps().iter().flat_map(|s| s.counter_groups()).collect()
    }

    fn counter_groups_matching_regex(&self, pattern: &Regex) -> HashSet<String> {
        self.read_steps()
            .iter()
            .flat_map(|s| s.counter_groups_matching_regex(pattern))
            .collect()
    }

    fn counters_for(&self, group: &str) -> HashSet<String> {
        self.read_steps().iter().flat_map(|s| s.counters_for(group)).collect()
    }

    fn counter_value_of(&self, group: &str, counter: &str) -> i64 {
        self.read_steps()
            .iter()
            .fold(0i64, |acc, s| acc.saturating_add(s.counter_value_of(group, counter)))
    }

    /// Nunca falla: los errores por step quedan aislados (ver `capture_detail_report`).
    fn capture_detail(&self) -> Result<(), StatsError> {
        let report = self.capture_detail_report();
        if !report.is_complete() {
            debug!("flow {}: {} of {} steps failed detail capture",
                   self.identity.flow_id,
                   report.failures.len(),
                   report.failures.len() + report.captured.len());
        }
        Ok(())
    }

    fn children(&self) -> Vec<Arc<dyn Stats>> {
        self.step_stats().into_iter().map(|s| s as Arc<dyn Stats>).collect()
    }

    fn stats_string(&self) -> String {
        format!("status={}, name={}, stepsCount={}", self.status(), self.name(), self.steps_count())
    }
}

impl fmt::Display for FlowStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flow{{{}}}", self.stats_string())
    }
}

impl fmt::Debug for FlowStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowStats")
         .field("identity", &self.identity)
         .field("status", &self.lifecycle.status())
         .field("steps_count", &self.steps_count())
         .finish()
    }
}
