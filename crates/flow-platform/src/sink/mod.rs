//! Implementaciones de `ClientState` con I/O.
//!
//! - `LogClientState`: emite cada snapshot como JSON por el facade `log`.
//! - `BufferedClientState`: entrega asíncrona vía canal `tokio` hacia un
//!   `SnapshotWriter` (p.ej. `JsonLinesWriter`).

mod buffered;
mod log_sink;

pub use buffered::{BufferedClientState, JsonLinesWriter, SnapshotWriter};
pub use log_sink::LogClientState;
