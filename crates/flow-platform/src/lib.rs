//! flow-platform: piezas de infraestructura alrededor de `flow-core`.
//!
//! - `config`: carga de `.env` y variables `FLOWSTATS_*`.
//! - `sink`: implementaciones de `ClientState` (log, JSON-lines bufferizado).
//! - `cluster`: harness de cluster con ámbito explícito para pruebas.
//! - `tuples`: capacidades de destino/fuente de tuplas sin almacenamiento.
pub mod cluster;
pub mod config;
pub mod error;
pub mod sink;
pub mod tuples;

pub use cluster::{local_properties, ClusterHarness};
pub use config::{init_dotenv, ClusterConfig, StatsConfig};
pub use error::PlatformError;
pub use sink::{BufferedClientState, JsonLinesWriter, LogClientState, SnapshotWriter};
pub use tuples::{DiscardSink, PassThrough, TupleSink};
