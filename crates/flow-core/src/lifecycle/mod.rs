//! Máquina de estados de ciclo de vida.
//!
//! - `state`: variante etiquetada del estado y causa de fallo.
//! - `policy`: tabla de transiciones y política ante transiciones ilegales.
//! - `machine`: contenedor concurrente (`Lifecycle`) con marcas de tiempo.

mod machine;
mod policy;
mod state;

pub use machine::{Lifecycle, LifecycleRecord};
pub use policy::{is_allowed, Transition, TransitionPolicy};
pub use state::{FailureCause, LifecycleState, Status};
