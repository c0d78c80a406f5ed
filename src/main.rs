//! Demo: un flow de tres steps sobre el harness local.
//!
//! Variables: `FLOWSTATS_*` (ver `flow_platform::config`) y `RUST_LOG`.
use std::fmt;
use std::sync::Arc;

use flow_core::{ClientState, CounterKey, CounterSample, DetailError, DetailSource, FailureCause, FlowIdentity,
                FlowStats, LifecycleError, ManagementServices, Stats, StatsError, Status, StepCounter, StepStats,
                Transition};
use flow_platform::{BufferedClientState, ClusterHarness, DiscardSink, JsonLinesWriter, LogClientState, PassThrough,
                    PlatformError, StatsConfig, TupleSink};
use log::{info, warn};

const LINES: [&str; 4] = ["the quick brown fox", "jumps over", "the lazy dog", ""];

/// Detalle que un cluster reportaría al terminar: confirma lo ya contado.
struct ReportedTotals {
    read: i64,
    written: i64,
}

impl DetailSource for ReportedTotals {
    fn fetch(&self, _step_id: &str) -> Result<Vec<CounterSample>, DetailError> {
        Ok(vec![CounterSample::new(StepCounter::GROUP, StepCounter::TuplesRead.name(), self.read),
                CounterSample::new(StepCounter::GROUP, StepCounter::TuplesWritten.name(), self.written)])
    }
}

#[derive(Debug)]
struct EmptyInput;

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("empty input")
    }
}

impl std::error::Error for EmptyInput {}

/// Cierra el flow: `Successful` sólo si todos los steps ejecutados lo fueron;
/// si no, `Failed` con la causa del primer step que no terminó bien.
fn finish_flow(flow: &FlowStats, steps: &[&Arc<StepStats>]) -> Result<Transition, LifecycleError> {
    let Some(step) = steps.iter().find(|s| s.status() != Status::Successful) else {
        return flow.mark_successful();
    };
    let cause = match step.state().failure() {
        Some(cause) => cause.clone(),
        None => FailureCause::from_message(format!("step {} ended {}", step.id(), step.status())),
    };
    flow.mark_failed(cause)
}

#[tokio::main]
async fn main() -> Result<(), PlatformError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr)
                             .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                             .try_init()
                             .ok();

    let config = StatsConfig::from_env()?;
    info!("transition policy: {:?}", config.transition_policy);

    let buffered = match &config.snapshot_log {
        Some(path) => Some(Arc::new(BufferedClientState::spawn(JsonLinesWriter::open(path).await?))),
        None => None,
    };
    let sink: Arc<dyn ClientState> = match &buffered {
        Some(b) => b.clone(),
        None => Arc::new(LogClientState::new()),
    };
    let services = Arc::new(ManagementServices::new(sink.clone()));

    let mut harness = ClusterHarness::new(config.cluster.clone(), services);
    harness.set_up()?;

    let flow = FlowStats::with_policy(FlowIdentity::generate("demo", "wordcount", env!("CARGO_PKG_VERSION"), "words"),
                                      sink.clone(),
                                      config.transition_policy);
    flow.mark_pending().map_err(StatsError::from)?;
    flow.mark_running().map_err(StatsError::from)?;

    let step = |id: &str| StepStats::new(flow.id(), id, id, sink.clone()).with_policy(config.transition_policy);
    let tokenize = Arc::new(step("tokenize").with_detail_source(ReportedTotals { read: 4, written: 9 }));
    let count = Arc::new(step("count"));
    let publish = Arc::new(step("publish"));
    for step in [&tokenize, &count, &publish] {
        flow.add_step_stats(step.clone());
    }

    harness.run_step(&tokenize, |p| {
               for line in LINES {
                   p.increment(&StepCounter::TuplesRead, 1);
                   p.increment(&StepCounter::TuplesWritten, line.split_whitespace().count() as i64);
               }
               Ok::<(), EmptyInput>(())
           })?;

    let words: Vec<String> = LINES.iter().flat_map(|l| l.split_whitespace()).map(str::to_string).collect();
    harness.run_step(&count, |p| {
               let mut source = PassThrough::new();
               source.set_iterator(words);
               let mut out = DiscardSink::default();
               for word in source {
                   p.increment(&StepCounter::TuplesRead, 1);
                   out.sink(word);
               }
               if out.seen() == 0 {
                   return Err(EmptyInput);
               }
               p.increment(&StepCounter::TuplesWritten, 1);
               Ok(())
           })?;

    // nada que publicar en modo demo
    publish.mark_skipped().map_err(StatsError::from)?;

    let report = flow.capture_detail_report();
    if !report.is_complete() {
        warn!("detail capture incomplete: {:?}", report.failures);
    }

    finish_flow(&flow, &[&tokenize, &count]).map_err(StatsError::from)?;

    for group in flow.counter_groups() {
        for counter in flow.counters_for(&group) {
            println!("{group}/{counter} = {}", flow.counter_value_of(&group, &counter));
        }
    }
    println!("{flow}");

    harness.tear_down();
    if let Some(b) = buffered {
        let written = b.shutdown().await?;
        info!("{written} snapshots written");
    }
    Ok(())
}
