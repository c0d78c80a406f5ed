//! Estadísticas de un step: contadores propios + ciclo de vida propio.
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use regex::Regex;

use super::{CounterKey, CounterSet, DetailSource, Stats};
use crate::errors::StatsError;
use crate::lifecycle::{Lifecycle, LifecycleState, TransitionPolicy};
use crate::sink::{ClientSnapshot, ClientState, StepSnapshot};

pub struct StepStats {
    flow_id: String,
    step_id: String,
    step_name: String,
    lifecycle: Lifecycle,
    counters: CounterSet,
    client_state: Arc<dyn ClientState>,
    detail_source: Option<Box<dyn DetailSource>>,
    detail_captured_at: RwLock<Option<DateTime<Utc>>>,
}

impl StepStats {
    pub fn new(flow_id: impl Into<String>,
               step_id: impl Into<String>,
               step_name: impl Into<String>,
               client_state: Arc<dyn ClientState>)
               -> Self {
        Self { flow_id: flow_id.into(),
               step_id: step_id.into(),
               step_name: step_name.into(),
               lifecycle: Lifecycle::default(),
               counters: CounterSet::new(),
               client_state,
               detail_source: None,
               detail_captured_at: RwLock::new(None) }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.lifecycle = Lifecycle::new(policy);
        self
    }

    pub fn with_detail_source(mut self, source: impl DetailSource + 'static) -> Self {
        self.detail_source = Some(Box::new(source));
        self
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn counters(&self) -> &CounterSet {
        &self.counters
    }

    pub fn increment(&self, group: &str, counter: &str, amount: i64) {
        self.counters.increment(group, counter, amount);
    }

    pub fn increment_key(&self, key: &dyn CounterKey, amount: i64) {
        self.counters.increment(key.group(), key.name(), amount);
    }

    /// Momento de la última captura de detalle exitosa.
    pub fn detail_captured_at(&self) -> Option<DateTime<Utc>> {
        *self.detail_captured_at.read().unwrap_or_else(|p| p.into_inner())
    }
}

impl Stats for StepStats {
    fn id(&self) -> &str {
        &self.step_id
    }

    fn name(&self) -> &str {
        &self.step_name
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn client_state(&self) -> &dyn ClientState {
        self.client_state.as_ref()
    }

    fn snapshot(&self, state: &LifecycleState) -> ClientSnapshot {
        ClientSnapshot::Step(StepSnapshot { flow_id: self.flow_id.clone(),
                                            step_id: self.step_id.clone(),
                                            step_name: self.step_name.clone(),
                                            status: state.status(),
                                            failure: state.failure().map(|c| c.to_string()),
                                            recorded_at: Utc::now() })
    }

    fn counter_groups(&self) -> HashSet<String> {
        self.counters.groups()
    }

    fn counter_groups_matching_regex(&self, pattern: &Regex) -> HashSet<String> {
        self.counters.groups_matching(pattern)
    }

    fn counters_for(&self, group: &str) -> HashSet<String> {
        self.counters.counters_for(group)
    }

    fn counter_value_of(&self, group: &str, counter: &str) -> i64 {
        self.counters.value(group, counter)
    }

    fn capture_detail(&self) -> Result<(), StatsError> {
        let Some(source) = &self.detail_source else {
            return Ok(());
        };
        let samples = source.fetch(&self.step_id)
                            .map_err(|e| StatsError::DetailCapture { step_id: self.step_id.clone(),
                                                                     reason: e.to_string() })?;
        for s in &samples {
            self.counters.set(&s.group, &s.counter, s.value);
        }
        *self.detail_captured_at.write().unwrap_or_else(|p| p.into_inner()) = Some(Utc::now());
        Ok(())
    }

    fn children(&self) -> Vec<Arc<dyn Stats>> {
        Vec::new()
    }
}

impl fmt::Display for StepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step{{{}}}", self.stats_string())
    }
}

impl fmt::Debug for StepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepStats")
         .field("flow_id", &self.flow_id)
         .field("step_id", &self.step_id)
         .field("step_name", &self.step_name)
         .field("status", &self.lifecycle.status())
         .finish()
    }
}
