use std::error::Error as StdError;

use super::CounterSample;

pub type DetailError = Box<dyn StdError + Send + Sync>;

/// Fuente de detalle diferido de un step (p.ej. consulta remota de contadores
/// al job tracker). Los valores devueltos son totales absolutos.
pub trait DetailSource: Send + Sync {
    fn fetch(&self, step_id: &str) -> Result<Vec<CounterSample>, DetailError>;
}
