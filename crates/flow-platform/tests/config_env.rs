//! Lectura real del entorno del proceso. Serializado porque muta variables
//! globales.
use std::env;
use std::path::PathBuf;

use flow_core::TransitionPolicy;
use flow_platform::config::{ENV_CLUSTER_ROOT, ENV_NUM_MAP_TASKS, ENV_NUM_REDUCE_TASKS, ENV_SNAPSHOT_LOG,
                            ENV_TRANSITION_POLICY, ENV_USE_CLUSTER};
use flow_platform::{PlatformError, StatsConfig};
use serial_test::serial;

const ALL: [&str; 6] = [ENV_TRANSITION_POLICY,
                        ENV_SNAPSHOT_LOG,
                        ENV_USE_CLUSTER,
                        ENV_CLUSTER_ROOT,
                        ENV_NUM_MAP_TASKS,
                        ENV_NUM_REDUCE_TASKS];

fn clear() {
    for key in ALL {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn from_env_reads_process_environment() {
    clear();
    env::set_var(ENV_TRANSITION_POLICY, " Lenient ");
    env::set_var(ENV_USE_CLUSTER, "1");
    env::set_var(ENV_NUM_MAP_TASKS, "6");
    env::set_var(ENV_SNAPSHOT_LOG, "snapshots.jsonl");

    let cfg = StatsConfig::from_env().expect("valid env");
    assert_eq!(cfg.transition_policy, TransitionPolicy::Lenient);
    assert!(cfg.cluster.use_cluster);
    assert_eq!(cfg.cluster.num_map_tasks, 6);
    assert_eq!(cfg.cluster.num_reduce_tasks, 1);
    assert_eq!(cfg.snapshot_log, Some(PathBuf::from("snapshots.jsonl")));
    clear();
}

#[test]
#[serial]
fn from_env_defaults_and_errors() {
    clear();
    assert_eq!(StatsConfig::from_env().expect("defaults"), StatsConfig::default());

    env::set_var(ENV_NUM_REDUCE_TASKS, "lots");
    let err = StatsConfig::from_env().unwrap_err();
    assert!(matches!(err, PlatformError::InvalidConfig { ref key, .. } if key == ENV_NUM_REDUCE_TASKS));
    clear();
}
