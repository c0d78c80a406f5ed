//! Harness de cluster para pruebas.
//!
//! No hay estado global: cada `ClusterHarness` es un valor explícito que se
//! inyecta donde se necesita. `set_up` es idempotente (el cluster arranca a
//! lo sumo una vez por harness) y el directorio temporal que respalda el
//! filesystem remoto simulado se libera en `tear_down` o al hacer drop.
//!
//! En modo local las copias de entrada/salida son no-ops.
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use flow_core::{FailureCause, FlowProcess, FlowSession, ManagementServices, Stats, StatsError, Status, StepProcess,
                StepStats};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::ClusterConfig;
use crate::error::PlatformError;

pub const PROP_NUM_MAP_TASKS: &str = "mapred.map.tasks";
pub const PROP_NUM_REDUCE_TASKS: &str = "mapred.reduce.tasks";
pub const PROP_JOB_POLLING_INTERVAL: &str = "flow.job.pollinginterval";

enum Backing {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl Backing {
    fn root(&self) -> &Path {
        match self {
            Backing::Temp(dir) => dir.path(),
            Backing::Fixed(path) => path,
        }
    }
}

pub struct ClusterHarness {
    config: ClusterConfig,
    session: Arc<FlowSession>,
    started: bool,
    remote: Option<Backing>,
}

impl ClusterHarness {
    pub fn new(config: ClusterConfig, services: Arc<ManagementServices>) -> Self {
        let session = FlowSession::new(services).with_id(format!("harness-{}", std::process::id()))
                                                .with_property(PROP_NUM_MAP_TASKS, config.num_map_tasks)
                                                .with_property(PROP_NUM_REDUCE_TASKS, config.num_reduce_tasks)
                                                .with_property(PROP_JOB_POLLING_INTERVAL, 10);
        Self { config,
               session: Arc::new(session),
               started: false,
               remote: None }
    }

    /// Arranca el cluster si aún no lo está. Llamadas repetidas no hacen nada.
    pub fn set_up(&mut self) -> Result<(), PlatformError> {
        if self.started {
            return Ok(());
        }
        if !self.config.use_cluster {
            info!("not using cluster");
        } else {
            info!("using cluster");
            let backing = match &self.config.root {
                Some(root) => {
                    fs::create_dir_all(root)?;
                    Backing::Fixed(root.clone())
                }
                None => Backing::Temp(tempfile::Builder::new().prefix("flowstats-cluster-").tempdir()?),
            };
            debug!("remote filesystem rooted at {}", backing.root().display());
            self.remote = Some(backing);
        }
        self.started = true;
        Ok(())
    }

    pub fn tear_down(&mut self) {
        if !self.started {
            return;
        }
        if let Some(backing) = self.remote.take() {
            debug!("releasing remote filesystem at {}", backing.root().display());
        }
        self.started = false;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_use_cluster(&self) -> bool {
        self.config.use_cluster
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Copia de las propiedades del harness.
    pub fn properties(&self) -> IndexMap<String, Value> {
        self.session.properties().clone()
    }

    pub fn session(&self) -> Arc<FlowSession> {
        self.session.clone()
    }

    /// Raíz del filesystem remoto simulado (sólo en modo cluster y arrancado).
    pub fn remote_root(&self) -> Option<&Path> {
        self.remote.as_ref().map(Backing::root)
    }

    pub fn copy_from_local(&self, input: impl AsRef<Path>) -> Result<(), PlatformError> {
        let input = input.as_ref();
        if !input.exists() {
            return Err(PlatformError::NotFound(input.to_path_buf()));
        }
        if !self.config.use_cluster {
            return Ok(());
        }
        let remote = self.remote_path(input)?;
        if !remote.exists() {
            if let Some(parent) = remote.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(input, &remote)?;
        }
        Ok(())
    }

    pub fn copy_to_local(&self, output: impl AsRef<Path>) -> Result<(), PlatformError> {
        if !self.config.use_cluster {
            return Ok(());
        }
        let output = output.as_ref();
        let remote = self.remote_path(output)?;
        if !remote.exists() {
            return Err(PlatformError::NotFound(output.to_path_buf()));
        }
        if output.exists() {
            fs::remove_file(output)?;
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&remote, output)?;
        Ok(())
    }

    pub fn remote_exists(&self, path: impl AsRef<Path>) -> Result<bool, PlatformError> {
        let path = path.as_ref();
        if !self.config.use_cluster {
            return Ok(path.exists());
        }
        Ok(self.remote_path(path)?.exists())
    }

    /// Ejecuta `job` como el cuerpo de un step: lo marca `Running`, le entrega
    /// un `StepProcess` (que también queda como proceso actual de la sesión) y
    /// lo marca `Successful` o `Failed` según el resultado. El error del job
    /// queda como causa del fallo; no se propaga.
    ///
    /// Si el step no puede pasar a `Running` (ya terminó, bajo política
    /// lenient) el job no se ejecuta y se devuelve el estado actual.
    pub fn run_step<F, E>(&self, step: &Arc<StepStats>, job: F) -> Result<Status, PlatformError>
        where F: FnOnce(&dyn FlowProcess) -> Result<(), E>,
              E: std::error::Error + Send + Sync + 'static
    {
        let started = step.mark_running().map_err(StatsError::from)?;
        if !started.is_applied() {
            warn!("step {} not started ({}), skipping job", step.id(), step.status());
            return Ok(step.status());
        }

        let process = Arc::new(StepProcess::new(step.clone(), self.session.clone()));
        self.session.set_current_process(&process);

        let finished = match job(process.as_ref()) {
            Ok(()) => step.mark_successful(),
            Err(e) => step.mark_failed(FailureCause::new(e)),
        };
        finished.map_err(StatsError::from)?;

        Ok(step.status())
    }

    fn remote_path(&self, path: &Path) -> Result<PathBuf, PlatformError> {
        let root = self.remote_root().ok_or(PlatformError::NotStarted)?;
        let relative: PathBuf = path.components()
                                    .filter(|c| matches!(c, Component::Normal(_)))
                                    .collect();
        Ok(root.join(relative))
    }
}

impl Drop for ClusterHarness {
    fn drop(&mut self) {
        self.tear_down();
    }
}

/// Propiedades por defecto para un harness sin cluster.
pub fn local_properties() -> IndexMap<String, Value> {
    let cfg = ClusterConfig::default();
    IndexMap::from([(PROP_NUM_MAP_TASKS.to_string(), json!(cfg.num_map_tasks)),
                    (PROP_NUM_REDUCE_TASKS.to_string(), json!(cfg.num_reduce_tasks)),
                    (PROP_JOB_POLLING_INTERVAL.to_string(), json!(10))])
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use flow_core::{InMemoryClientState, StepCounter, TransitionPolicy};

    #[derive(Debug)]
    struct JobError(&'static str);

    impl fmt::Display for JobError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for JobError {}

    fn services() -> Arc<ManagementServices> {
        Arc::new(ManagementServices::new(Arc::new(InMemoryClientState::new())))
    }

    fn cluster_config() -> ClusterConfig {
        ClusterConfig { use_cluster: true,
                        ..ClusterConfig::default() }
    }

    #[test]
    fn local_mode_copies_are_noops_but_check_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.txt");
        fs::write(&input, "a\nb\n").expect("write");

        let mut h = ClusterHarness::new(ClusterConfig::default(), services());
        h.set_up().expect("set up");
        assert!(h.remote_root().is_none());
        h.copy_from_local(&input).expect("existing input");
        h.copy_to_local(dir.path().join("never-written.txt")).expect("noop");

        let err = h.copy_from_local(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
        assert_eq!(h.properties(), local_properties());
    }

    #[test]
    fn set_up_is_idempotent_and_tear_down_releases_backing() {
        let mut h = ClusterHarness::new(cluster_config(), services());
        h.set_up().expect("first");
        let root = h.remote_root().expect("root").to_path_buf();
        h.set_up().expect("second");
        assert_eq!(h.remote_root(), Some(root.as_path()));
        assert!(root.exists());

        h.tear_down();
        assert!(!h.is_started());
        assert!(!root.exists(), "temporary backing must be removed");
    }

    #[test]
    fn cluster_mode_round_trips_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("data").join("in.txt");
        fs::create_dir_all(input.parent().expect("parent")).expect("mkdir");
        fs::write(&input, "hello").expect("write");

        let mut h = ClusterHarness::new(cluster_config(), services());
        assert!(matches!(h.copy_from_local(&input), Err(PlatformError::NotStarted)));
        h.set_up().expect("set up");

        h.copy_from_local(&input).expect("copy in");
        assert!(h.remote_exists(&input).expect("exists"));

        fs::write(&input, "stale").expect("overwrite local");
        h.copy_to_local(&input).expect("copy out");
        assert_eq!(fs::read_to_string(&input).expect("read"), "hello");

        let err = h.copy_to_local(dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));
    }

    #[test]
    fn run_step_records_outcome_and_counters() {
        let sink = Arc::new(InMemoryClientState::new());
        let h = ClusterHarness::new(ClusterConfig::default(), Arc::new(ManagementServices::new(sink.clone())));

        let ok = Arc::new(StepStats::new("f1", "s1", "map", sink.clone()));
        let session = h.session();
        let status = h.run_step(&ok, |p| {
                          p.increment(&StepCounter::TuplesRead, 10);
                          let current = session.current_process().map(|c| c.id().to_string());
                          assert_eq!(current.as_deref(), Some("s1"));
                          Ok::<(), JobError>(())
                      })
                      .expect("run");
        assert_eq!(status, Status::Successful);
        assert_eq!(ok.counter_value(&StepCounter::TuplesRead), 10);
        // el proceso vive sólo mientras corre el job
        assert!(session.current_process().is_none());

        let bad = Arc::new(StepStats::new("f1", "s2", "reduce", sink.clone()));
        let status = h.run_step(&bad, |_| Err(JobError("disk full"))).expect("run");
        assert_eq!(status, Status::Failed);
        assert_eq!(bad.state().failure().map(|c| c.to_string()).as_deref(), Some("disk full"));

        // running + terminal por step
        assert_eq!(sink.len(), 4);
        // un step terminado no se puede volver a ejecutar
        assert!(matches!(h.run_step(&ok, |_| Ok::<(), JobError>(())),
                         Err(PlatformError::Stats(StatsError::Lifecycle(_)))));
    }

    #[test]
    fn finished_step_is_not_rerun_under_lenient_policy() {
        let sink = Arc::new(InMemoryClientState::new());
        let h = ClusterHarness::new(ClusterConfig::default(), Arc::new(ManagementServices::new(sink.clone())));
        let step = Arc::new(StepStats::new("f1", "s1", "map", sink.clone()).with_policy(TransitionPolicy::Lenient));

        let job = |p: &dyn FlowProcess| {
            p.increment_counter("G", "C", 10);
            Ok::<(), JobError>(())
        };
        assert_eq!(h.run_step(&step, job).expect("first run"), Status::Successful);

        let mut ran = false;
        let status = h.run_step(&step, |_| {
                          ran = true;
                          Ok::<(), JobError>(())
                      })
                      .expect("lenient never errors");
        assert!(!ran, "job must not run on a finished step");
        assert_eq!(status, Status::Successful);
        assert_eq!(step.counter_value_of("G", "C"), 10);
        assert_eq!(sink.len(), 2);
    }
}
