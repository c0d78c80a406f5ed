//! Máquina de estados compartida por `FlowStats` y `StepStats`.
//!
//! La mutación se confirma bajo el lock de escritura y el lock se libera
//! antes de que el llamador notifique al sink: cualquier lector concurrente
//! ve el nuevo estado antes de que el snapshot salga.
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use super::policy::{is_allowed, Transition, TransitionPolicy};
use super::{LifecycleState, Status};
use crate::errors::LifecycleError;

/// Estado más marcas de tiempo de cada fase.
#[derive(Debug, Clone, Default)]
pub struct LifecycleRecord {
    pub state: LifecycleState,
    pub pending_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    policy: TransitionPolicy,
    inner: RwLock<LifecycleRecord>,
}

impl Lifecycle {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy,
               inner: RwLock::new(LifecycleRecord::default()) }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn state(&self) -> LifecycleState {
        self.read().state.clone()
    }

    pub fn status(&self) -> Status {
        self.read().state.status()
    }

    /// Copia del registro completo (estado + tiempos).
    pub fn record(&self) -> LifecycleRecord {
        self.read().clone()
    }

    /// Tiempo entre inicio y fin; si sigue corriendo, hasta ahora.
    pub fn duration(&self) -> Option<Duration> {
        let rec = self.read();
        let started = rec.started_at?;
        Some(rec.finished_at.unwrap_or_else(Utc::now) - started)
    }

    /// Aplica `target` si la tabla lo permite. `subject` sólo se usa en logs.
    pub fn transition(&self, target: LifecycleState, subject: &str) -> Result<Transition, LifecycleError> {
        self.commit(target, subject).map(|(transition, _)| transition)
    }

    /// Igual que `transition`, pero devuelve además el estado tal como quedó
    /// bajo el lock. Una escritura concurrente posterior no lo altera.
    pub fn commit(&self, target: LifecycleState, subject: &str) -> Result<(Transition, LifecycleState), LifecycleError> {
        let to = target.status();
        let mut rec = self.write();
        let from = rec.state.status();

        if !is_allowed(from, to) {
            return match self.policy {
                TransitionPolicy::Strict => Err(LifecycleError::IllegalTransition { from, to }),
                TransitionPolicy::Lenient => {
                    warn!("{subject}: ignoring illegal transition {from} -> {to}");
                    Ok((Transition::Ignored { from, to }, rec.state.clone()))
                }
            };
        }

        let now = Utc::now();
        match to {
            Status::Pending => rec.pending_at = Some(now),
            Status::Running => rec.started_at = Some(now),
            _ => rec.finished_at = Some(now),
        }
        rec.state = target.clone();
        drop(rec);

        debug!("{subject}: {from} -> {to}");
        Ok((Transition::Applied { from, to }, target))
    }

    fn read(&self) -> RwLockReadGuard<'_, LifecycleRecord> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LifecycleRecord> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::FailureCause;

    #[test]
    fn happy_path_sets_timestamps() {
        let lc = Lifecycle::new(TransitionPolicy::Strict);
        assert_eq!(lc.status(), Status::Pending);
        assert!(lc.duration().is_none());

        lc.transition(LifecycleState::Running, "t").expect("running");
        assert!(lc.duration().is_some());
        lc.transition(LifecycleState::Successful, "t").expect("successful");

        let rec = lc.record();
        assert_eq!(rec.state.status(), Status::Successful);
        assert!(rec.started_at.is_some());
        assert!(rec.finished_at >= rec.started_at);
    }

    #[test]
    fn strict_rejects_leaving_terminal_and_keeps_state() {
        let lc = Lifecycle::new(TransitionPolicy::Strict);
        lc.transition(LifecycleState::Running, "t").expect("running");
        lc.transition(LifecycleState::Failed(FailureCause::from_message("boom")), "t")
          .expect("failed");

        let err = lc.transition(LifecycleState::Running, "t").unwrap_err();
        assert_eq!(err,
                   LifecycleError::IllegalTransition { from: Status::Failed,
                                                       to: Status::Running });
        assert_eq!(lc.status(), Status::Failed);
        assert_eq!(lc.state().failure().map(|c| c.to_string()).as_deref(), Some("boom"));
    }

    #[test]
    fn lenient_ignores_illegal_transition() {
        let lc = Lifecycle::new(TransitionPolicy::Lenient);
        lc.transition(LifecycleState::Running, "t").expect("running");
        lc.transition(LifecycleState::Stopped, "t").expect("stopped");
        let t = lc.transition(LifecycleState::Successful, "t").expect("lenient never errors");
        assert_eq!(t,
                   Transition::Ignored { from: Status::Stopped,
                                         to: Status::Successful });
        assert!(!t.is_applied());
        assert_eq!(lc.status(), Status::Stopped);
    }

    #[test]
    fn commit_returns_state_as_committed() {
        let lc = Lifecycle::new(TransitionPolicy::Lenient);
        let (t, committed) = lc.commit(LifecycleState::Running, "t").expect("running");
        assert!(t.is_applied());
        assert_eq!(committed.status(), Status::Running);

        lc.transition(LifecycleState::Failed(FailureCause::from_message("oom")), "t")
          .expect("failed");
        // lo que se devolvió antes no cambia con escrituras posteriores
        assert_eq!(committed.status(), Status::Running);

        let (t, current) = lc.commit(LifecycleState::Running, "t").expect("lenient");
        assert!(!t.is_applied());
        assert_eq!(current.failure().map(|c| c.to_string()).as_deref(), Some("oom"));
    }
}
