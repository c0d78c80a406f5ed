//! Sink bufferizado: `record` encola sin bloquear y una tarea de fondo
//! drena la cola hacia un `SnapshotWriter`.
//!
//! El orden de entrega es el orden de `record`. La escritura ocurre fuera
//! del hilo que transiciona el ciclo de vida, por lo que un lector del estado
//! puede ver el nuevo estado antes de que el snapshot esté persistido.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use flow_core::{ClientSnapshot, ClientState};
use log::{debug, error};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::PlatformError;

/// Destino final de los snapshots (archivo, red, ...).
#[async_trait]
pub trait SnapshotWriter: Send + 'static {
    async fn write(&mut self, snapshot: &ClientSnapshot) -> Result<(), PlatformError>;

    async fn flush(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Un snapshot JSON por línea, en modo append.
pub struct JsonLinesWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl JsonLinesWriter {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        Ok(Self { path,
                  out: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotWriter for JsonLinesWriter {
    async fn write(&mut self, snapshot: &ClientSnapshot) -> Result<(), PlatformError> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), PlatformError> {
        self.out.flush().await?;
        Ok(())
    }
}

pub struct BufferedClientState {
    tx: Mutex<Option<UnboundedSender<ClientSnapshot>>>,
    worker: Mutex<Option<JoinHandle<usize>>>,
}

impl BufferedClientState {
    /// Lanza la tarea de drenado. Debe llamarse dentro de un runtime tokio.
    pub fn spawn<W>(writer: W) -> Self
        where W: SnapshotWriter
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(drain(rx, writer));
        Self { tx: Mutex::new(Some(tx)),
               worker: Mutex::new(Some(worker)) }
    }

    /// Cierra la cola, espera a que se escriba todo lo pendiente y devuelve
    /// cuántos snapshots se escribieron.
    pub async fn shutdown(&self) -> Result<usize, PlatformError> {
        drop(self.tx.lock().unwrap_or_else(|p| p.into_inner()).take());
        let worker = self.worker
                         .lock()
                         .unwrap_or_else(|p| p.into_inner())
                         .take()
                         .ok_or(PlatformError::SinkClosed)?;
        worker.await.map_err(|e| {
                        error!("snapshot writer task failed: {e}");
                        PlatformError::SinkClosed
                    })
    }
}

impl ClientState for BufferedClientState {
    fn record(&self, snapshot: ClientSnapshot) {
        let guard = self.tx.lock().unwrap_or_else(|p| p.into_inner());
        let sent = match guard.as_ref() {
            Some(tx) => tx.send(snapshot).map_err(|e| e.0),
            None => Err(snapshot),
        };
        if let Err(lost) = sent {
            error!("snapshot sink closed, dropping {} snapshot for flow {}",
                   lost.status(),
                   lost.flow_id());
        }
    }
}

async fn drain<W>(mut rx: UnboundedReceiver<ClientSnapshot>, mut writer: W) -> usize
    where W: SnapshotWriter
{
    let mut written = 0usize;
    while let Some(snapshot) = rx.recv().await {
        match writer.write(&snapshot).await {
            Ok(()) => written += 1,
            Err(e) => error!("cannot write snapshot for flow {}: {e}", snapshot.flow_id()),
        }
    }
    if let Err(e) = writer.flush().await {
        error!("cannot flush snapshot writer: {e}");
    }
    debug!("snapshot writer drained {written} snapshots");
    written
}
