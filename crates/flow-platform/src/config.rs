//! Carga de configuración desde variables de entorno.
//! Usa el prefijo `FLOWSTATS_` y carga `.env` (si existe) una sola vez.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use flow_core::TransitionPolicy;
use once_cell::sync::Lazy;

use crate::error::PlatformError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const ENV_TRANSITION_POLICY: &str = "FLOWSTATS_TRANSITION_POLICY";
pub const ENV_SNAPSHOT_LOG: &str = "FLOWSTATS_SNAPSHOT_LOG";
pub const ENV_USE_CLUSTER: &str = "FLOWSTATS_USE_CLUSTER";
pub const ENV_CLUSTER_ROOT: &str = "FLOWSTATS_CLUSTER_ROOT";
pub const ENV_NUM_MAP_TASKS: &str = "FLOWSTATS_NUM_MAP_TASKS";
pub const ENV_NUM_REDUCE_TASKS: &str = "FLOWSTATS_NUM_REDUCE_TASKS";

/// Parámetros del harness de cluster de pruebas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// `false` = modo local (copias no-op).
    pub use_cluster: bool,
    /// Directorio que respalda el filesystem remoto simulado; `None` = temporal.
    pub root: Option<PathBuf>,
    pub num_map_tasks: u32,
    pub num_reduce_tasks: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { use_cluster: false,
               root: None,
               num_map_tasks: 4,
               num_reduce_tasks: 1 }
    }
}

impl ClusterConfig {
    /// Valores no positivos se ignoran.
    pub fn set_num_map_tasks(&mut self, n: i64) {
        if let Ok(n) = u32::try_from(n) {
            if n > 0 {
                self.num_map_tasks = n;
            }
        }
    }

    pub fn set_num_reduce_tasks(&mut self, n: i64) {
        if let Ok(n) = u32::try_from(n) {
            if n > 0 {
                self.num_reduce_tasks = n;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsConfig {
    pub transition_policy: TransitionPolicy,
    /// Log JSON-lines de snapshots; `None` = sink basado en `log`.
    pub snapshot_log: Option<PathBuf>,
    pub cluster: ClusterConfig,
}

impl StatsConfig {
    pub fn from_env() -> Result<Self, PlatformError> {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de una función arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlatformError>
        where F: Fn(&str) -> Option<String>
    {
        let mut cfg = StatsConfig::default();

        if let Some(v) = lookup(ENV_TRANSITION_POLICY) {
            cfg.transition_policy = v.parse().map_err(|reason| invalid(ENV_TRANSITION_POLICY, &v, reason))?;
        }
        cfg.snapshot_log = lookup(ENV_SNAPSHOT_LOG).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(v) = lookup(ENV_USE_CLUSTER) {
            cfg.cluster.use_cluster = parse_bool(&v).ok_or_else(|| invalid(ENV_USE_CLUSTER, &v, "expected true/false".into()))?;
        }
        cfg.cluster.root = lookup(ENV_CLUSTER_ROOT).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(v) = lookup(ENV_NUM_MAP_TASKS) {
            let n = parse_int(ENV_NUM_MAP_TASKS, &v)?;
            cfg.cluster.set_num_map_tasks(n);
        }
        if let Some(v) = lookup(ENV_NUM_REDUCE_TASKS) {
            let n = parse_int(ENV_NUM_REDUCE_TASKS, &v)?;
            cfg.cluster.set_num_reduce_tasks(n);
        }
        Ok(cfg)
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_int(key: &str, v: &str) -> Result<i64, PlatformError> {
    v.trim().parse::<i64>().map_err(|e| invalid(key, v, e.to_string()))
}

fn invalid(key: &str, value: &str, reason: String) -> PlatformError {
    PlatformError::InvalidConfig { key: key.to_string(),
                                   value: value.to_string(),
                                   reason }
}
