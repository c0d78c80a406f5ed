//! Contrato del Client State Sink y modelo de snapshots.

mod snapshot;
mod store;

pub use snapshot::{ClientSnapshot, FlowSnapshot, StepSnapshot};
pub use store::{ClientState, InMemoryClientState, NullClientState};
