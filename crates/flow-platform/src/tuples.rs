//! Capacidades explícitas para flujos de tuplas sin almacenamiento real.
//!
//! En lugar de una colección "siempre vacía" que implementa un contrato de
//! colección completo con mutadores que no hacen nada, se separan dos
//! capacidades: un destino de sólo escritura (`TupleSink`) y una fuente de
//! sólo lectura que deja pasar una secuencia externa (`PassThrough`).
use std::fmt;

/// Destino de sólo escritura.
pub trait TupleSink<T> {
    fn sink(&mut self, item: T);
}

/// Descarta todo lo que recibe; cuenta cuántos elementos vio.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscardSink {
    seen: u64,
}

impl DiscardSink {
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl<T> TupleSink<T> for DiscardSink {
    fn sink(&mut self, _item: T) {
        self.seen += 1;
    }
}

/// Fuente que entrega la secuencia suministrada externamente, o una vacía si
/// nunca se suministró. No almacena nada: `len()` siempre es 0.
pub struct PassThrough<T> {
    iter: Option<Box<dyn Iterator<Item = T> + Send>>,
}

impl<T> PassThrough<T> {
    pub fn new() -> Self {
        Self { iter: None }
    }

    pub fn set_iterator<I>(&mut self, iter: I)
        where I: IntoIterator<Item = T>,
              I::IntoIter: Send + 'static
    {
        self.iter = Some(Box::new(iter.into_iter()));
    }

    pub fn len(&self) -> usize {
        0
    }

    /// `true` sólo si nunca se suministró una secuencia.
    pub fn is_empty(&self) -> bool {
        self.iter.is_none()
    }

    pub fn contains(&self, _item: &T) -> bool {
        false
    }
}

impl<T> Default for PassThrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Iterator for PassThrough<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.iter.as_mut()?.next()
    }
}

impl<T> fmt::Debug for PassThrough<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThrough").field("supplied", &self.iter.is_some()).finish()
    }
}
