//! Contadores agrupados por nombre de grupo, descubiertos de forma perezosa.
use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Clave de contador definida por la aplicación (equivalente a un enum de
/// contadores): un grupo y un nombre.
pub trait CounterKey {
    fn group(&self) -> &str;
    fn name(&self) -> &str;
}

impl CounterKey for (&str, &str) {
    fn group(&self) -> &str {
        self.0
    }
    fn name(&self) -> &str {
        self.1
    }
}

/// Contadores estándar que todo step reporta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepCounter {
    TuplesRead,
    TuplesWritten,
}

impl StepCounter {
    pub const GROUP: &'static str = "flow.StepCounters";
}

impl CounterKey for StepCounter {
    fn group(&self) -> &str {
        Self::GROUP
    }
    fn name(&self) -> &str {
        match self {
            StepCounter::TuplesRead => "Tuples_Read",
            StepCounter::TuplesWritten => "Tuples_Written",
        }
    }
}

/// Valor absoluto de un contador obtenido de una fuente remota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    pub group: String,
    pub counter: String,
    pub value: i64,
}

impl CounterSample {
    pub fn new(group: impl Into<String>, counter: impl Into<String>, value: i64) -> Self {
        Self { group: group.into(),
               counter: counter.into(),
               value }
    }
}

/// Mapa concurrente grupo -> (contador -> valor). Un valor ausente equivale a 0.
#[derive(Debug, Default)]
pub struct CounterSet {
    groups: DashMap<String, HashMap<String, i64>>,
}

impl CounterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, group: &str, counter: &str, amount: i64) {
        let mut counters = self.groups.entry(group.to_string()).or_default();
        let value = counters.entry(counter.to_string()).or_insert(0);
        *value = value.saturating_add(amount);
    }

    /// Sobrescribe el total (usado al materializar contadores remotos).
    pub fn set(&self, group: &str, counter: &str, value: i64) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(counter.to_string(), value);
    }

    pub fn value(&self, group: &str, counter: &str) -> i64 {
        self.groups
            .get(group)
            .and_then(|g| g.get(counter).copied())
            .unwrap_or(0)
    }

    pub fn groups(&self) -> HashSet<String> {
        self.groups.iter().map(|e| e.key().clone()).collect()
    }

    pub fn groups_matching(&self, pattern: &Regex) -> HashSet<String> {
        self.groups
            .iter()
            .filter(|e| pattern.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn counters_for(&self, group: &str) -> HashSet<String> {
        self.groups
            .get(group)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_counter_reads_zero() {
        let c = CounterSet::new();
        assert_eq!(c.value("G", "C"), 0);
        assert!(c.groups().is_empty());
        assert!(c.counters_for("G").is_empty());
    }

    #[test]
    fn increments_accumulate_and_set_overrides() {
        let c = CounterSet::new();
        c.increment("G", "C", 5);
        c.increment("G", "C", 7);
        c.increment("G", "D", 1);
        assert_eq!(c.value("G", "C"), 12);
        c.set("G", "C", 3);
        assert_eq!(c.value("G", "C"), 3);
        assert_eq!(c.counters_for("G"), HashSet::from(["C".to_string(), "D".to_string()]));
    }

    #[test]
    fn increment_saturates_instead_of_overflowing() {
        let c = CounterSet::new();
        c.set("G", "C", i64::MAX - 1);
        c.increment("G", "C", 10);
        assert_eq!(c.value("G", "C"), i64::MAX);
    }

    #[test]
    fn step_counter_keys() {
        assert_eq!(StepCounter::TuplesRead.group(), "flow.StepCounters");
        assert_eq!(StepCounter::TuplesWritten.name(), "Tuples_Written");
        assert_eq!(("g", "c").name(), "c");
    }
}
