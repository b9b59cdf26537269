use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::{CacheState, SnapshotStore};
use crate::metrics::SNAPSHOT_SAVES;

/// Request sent to the [`SnapshotWriter`].
#[derive(Debug)]
pub enum PersistCommand {
    /// Write the snapshot if the cache changed since the last write.
    Save,
    /// Write unconditionally and acknowledge once done.
    Flush(oneshot::Sender<()>),
}

/// Handle for requesting snapshot writes
///
/// This is cheaply cloneable. Requests go through a bounded channel to the
/// background writer so callers never wait on disk I/O unless they flush.
#[derive(Clone)]
pub struct PersistHandle {
    tx: mpsc::Sender<PersistCommand>,
}

impl PersistHandle {
    pub fn new(tx: mpsc::Sender<PersistCommand>) -> Self {
        Self { tx }
    }

    /// Ask for a save without waiting.
    ///
    /// A full channel already holds a pending save, so the request is dropped.
    pub fn request_save(&self) {
        match self.tx.try_send(PersistCommand::Save) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Snapshot save already queued");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Snapshot writer is gone, save request dropped");
            }
        }
    }

    /// Write the snapshot now and wait until it is on disk (or failed).
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if let Err(e) = self.tx.send(PersistCommand::Flush(ack_tx)).await {
            error!("Failed to request snapshot flush: {}", e);
            return;
        }
        if ack_rx.await.is_err() {
            error!("Snapshot writer stopped before acknowledging flush");
        }
    }
}

/// Background task that writes cache snapshots
pub struct SnapshotWriter {
    rx: mpsc::Receiver<PersistCommand>,
    state: Arc<CacheState>,
    store: Arc<SnapshotStore>,
    saved_generation: Option<u64>,
}

impl SnapshotWriter {
    pub(super) fn new(
        rx: mpsc::Receiver<PersistCommand>,
        state: Arc<CacheState>,
        store: Arc<SnapshotStore>,
    ) -> Self {
        // The initial map came from disk, so generation 0 is already saved.
        Self {
            rx,
            state,
            store,
            saved_generation: Some(0),
        }
    }

    /// Run the writer until every handle is dropped
    ///
    /// This should be spawned as a background task. Pending changes are
    /// written once more before it returns.
    pub async fn run(mut self) {
        info!("Snapshot writer started");

        while let Some(command) = self.rx.recv().await {
            let mut force = false;
            let mut acks = Vec::new();
            Self::collect(command, &mut force, &mut acks);

            // Coalesce whatever else is already queued into one write.
            while let Ok(command) = self.rx.try_recv() {
                Self::collect(command, &mut force, &mut acks);
            }

            self.persist(force).await;

            for ack in acks {
                let _ = ack.send(());
            }
        }

        self.persist(false).await;
        info!("Snapshot writer shutting down");
    }

    fn collect(command: PersistCommand, force: &mut bool, acks: &mut Vec<oneshot::Sender<()>>) {
        if let PersistCommand::Flush(ack) = command {
            *force = true;
            acks.push(ack);
        }
    }

    async fn persist(&mut self, force: bool) {
        let (map, generation) = self.state.consistent_view().await;

        if !force && self.saved_generation == Some(generation) {
            debug!(generation, "Cache unchanged since last snapshot");
            return;
        }

        let store = Arc::clone(&self.store);
        let entries = map.len();
        match tokio::task::spawn_blocking(move || store.save(&map)).await {
            Ok(Ok(bytes)) => {
                self.saved_generation = Some(generation);
                SNAPSHOT_SAVES.with_label_values(&["success"]).inc();
                debug!(entries, bytes, generation, "Cache snapshot persisted");
            }
            Ok(Err(e)) => {
                SNAPSHOT_SAVES.with_label_values(&["failed"]).inc();
                error!(error = %e, "Failed to persist cache snapshot");
            }
            Err(e) => {
                SNAPSHOT_SAVES.with_label_values(&["failed"]).inc();
                error!(error = %e, "Snapshot write task panicked");
            }
        }
    }
}
