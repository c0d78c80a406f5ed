//! flow-core: ciclo de vida y agregación de estadísticas de Flows y Steps.
//!
//! Un `FlowStats` se crea junto con su Flow, transita por los estados del
//! ciclo de vida a medida que avanza la ejecución y recibe un `StepStats` por
//! cada sub-job que arranca. Cada transición aceptada se refleja en el
//! `ClientState` (sink de monitoreo) como un único snapshot.
pub mod errors;
pub mod lifecycle;
pub mod session;
pub mod sink;
pub mod stats;

pub use errors::{LifecycleError, StatsError};
pub use lifecycle::{FailureCause, Lifecycle, LifecycleState, Status, Transition, TransitionPolicy};
pub use session::{FlowProcess, FlowSession, ManagementServices, StepProcess};
pub use sink::{ClientSnapshot, ClientState, FlowSnapshot, InMemoryClientState, NullClientState, StepSnapshot};
pub use stats::{CaptureReport, CounterKey, CounterSample, DetailError, DetailSource, FlowIdentity, FlowStats, Stats,
                StepCounter, StepStats};
