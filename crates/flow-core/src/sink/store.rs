use std::sync::Mutex;

use super::ClientSnapshot;

/// Sink externo que persiste un snapshot por cada cambio de ciclo de vida.
///
/// `record` puede hacer I/O (red, disco) y debe tratarse como lento; la
/// entrega puede ser asíncrona o estar bufferizada por la implementación.
pub trait ClientState: Send + Sync {
    fn record(&self, snapshot: ClientSnapshot);
}

/// Sink inerte: descarta todo. Es el que usa la sesión nula.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullClientState;

impl ClientState for NullClientState {
    fn record(&self, _snapshot: ClientSnapshot) {}
}

/// Sink en memoria append-only (tests y demo).
#[derive(Debug, Default)]
pub struct InMemoryClientState {
    inner: Mutex<Vec<ClientSnapshot>>,
}

impl InMemoryClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots recibidos, en orden de llegada.
    pub fn snapshots(&self) -> Vec<ClientSnapshot> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_else(|p| p.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.snapshots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<ClientSnapshot> {
        self.snapshots().pop()
    }
}

impl ClientState for InMemoryClientState {
    fn record(&self, snapshot: ClientSnapshot) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        guard.push(snapshot);
    }
}
