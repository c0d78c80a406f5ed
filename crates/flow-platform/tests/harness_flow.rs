//! Un flow completo corriendo sobre el harness, con snapshots persistidos
//! como JSON-lines.
use std::fmt;
use std::fs;
use std::sync::Arc;

use flow_core::{ClientSnapshot, FlowIdentity, FlowStats, ManagementServices, Stats, Status, StepCounter, StepStats};
use flow_platform::{BufferedClientState, ClusterConfig, ClusterHarness, DiscardSink, JsonLinesWriter, PassThrough,
                    TupleSink};

#[derive(Debug)]
struct Never;

impl fmt::Display for Never {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("never")
    }
}

impl std::error::Error for Never {}

#[test]
fn flow_over_cluster_harness_persists_snapshots() {
    tokio_test::block_on(async {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_path = dir.path().join("snapshots.jsonl");
        let input = dir.path().join("words.txt");
        fs::write(&input, "a b c\nd e\n").expect("write input");

        let writer = JsonLinesWriter::open(&log_path).await.expect("open log");
        let sink = Arc::new(BufferedClientState::spawn(writer));
        let services = Arc::new(ManagementServices::new(sink.clone()));

        let config = ClusterConfig { use_cluster: true,
                                     root: Some(dir.path().join("remote")),
                                     ..ClusterConfig::default() };
        let mut harness = ClusterHarness::new(config, services.clone());
        harness.set_up().expect("set up");
        harness.copy_from_local(&input).expect("copy in");

        let flow = FlowStats::new(FlowIdentity::generate("app", "wordcount", "1", "count"), services.client_state());
        flow.mark_pending().expect("pending");
        flow.mark_running().expect("running");

        let step = Arc::new(StepStats::new(flow.id(), "count-1", "count", services.client_state()));
        flow.add_step_stats(step.clone());

        let text = fs::read_to_string(&input).expect("read input");
        let status = harness.run_step(&step, |p| {
                                let mut source = PassThrough::new();
                                source.set_iterator(text.split_whitespace().map(str::to_string).collect::<Vec<_>>());
                                let mut out = DiscardSink::default();
                                for word in source {
                                    p.increment(&StepCounter::TuplesRead, 1);
                                    out.sink(word);
                                    p.increment(&StepCounter::TuplesWritten, 1);
                                }
                                Ok::<(), Never>(())
                            })
                            .expect("run step");
        assert_eq!(status, Status::Successful);

        flow.mark_successful().expect("flow done");
        assert_eq!(flow.counter_value(&StepCounter::TuplesRead), 5);
        assert_eq!(flow.counter_value(&StepCounter::TuplesWritten), 5);

        harness.tear_down();
        // flow: pending, running, successful; step: running, successful
        assert_eq!(sink.shutdown().await.expect("shutdown"), 5);

        let text = fs::read_to_string(&log_path).expect("read log");
        let snapshots: Vec<ClientSnapshot> = text.lines()
                                                 .map(|l| serde_json::from_str(l).expect("json line"))
                                                 .collect();
        let last = snapshots.last().and_then(ClientSnapshot::as_flow).expect("flow snapshot last");
        assert_eq!(last.status, Status::Successful);
        assert_eq!(last.steps_count, 1);
        assert_eq!(last.flow_name, "count");
    });
}
