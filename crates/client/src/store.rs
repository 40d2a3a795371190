//! Reactive record store client.
//!
//! `BeaverStore` is the adapter between UI event handlers and the record-sync
//! service. Reads are subscriptions (`subscribe_to_all`); writes are
//! transactions that:
//!
//! - show up in this client's snapshots immediately (optimistic overlay)
//! - are submitted one at a time, in call order, by a single writer task
//! - never block the caller
//! - settle into a `WriteEvent` on the store's bus and into the returned
//!   `PendingWrite`, which the caller may await or drop
//!
//! Failed writes are not retried. They are rolled back from the overlay,
//! logged, and reported on both channels above.

use std::sync::Arc;

use bhvr_core::{AppId, Beaver, BeaverId, BeaverName, ColorPicker, RandomColorPicker};
use bhvr_events::{EventBus, InMemoryEventBus, Subscription, Transaction, TxReceipt, WriteEvent};
use bhvr_infra::{SyncService, SyncServiceError};
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::overlay::Overlay;
use crate::subscription::SnapshotStream;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error(transparent)]
    Service(#[from] SyncServiceError),

    /// The writer task went away before the transaction settled.
    #[error("write queue closed before the transaction settled")]
    Dropped,
}

/// Handle to a submitted transaction.
///
/// Dropping it does not cancel anything: the write is fire-and-forget unless
/// the caller chooses to await [`PendingWrite::outcome`].
#[derive(Debug)]
pub struct PendingWrite {
    tx_id: Uuid,
    ids: Vec<BeaverId>,
    reply: oneshot::Receiver<Result<TxReceipt, WriteError>>,
}

impl PendingWrite {
    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    /// Beavers the transaction creates or deletes.
    pub fn ids(&self) -> &[BeaverId] {
        &self.ids
    }

    /// Wait until the service commits or refuses the transaction.
    pub async fn outcome(self) -> Result<TxReceipt, WriteError> {
        self.reply.await.map_err(|_| WriteError::Dropped)?
    }
}

#[derive(Debug)]
struct QueuedWrite {
    tx: Transaction,
    reply: oneshot::Sender<Result<TxReceipt, WriteError>>,
}

/// Client handle for the `beavers` collection of one app namespace.
///
/// Cheap to clone; clones share the overlay, the writer task and the bus.
pub struct BeaverStore<S> {
    service: Arc<S>,
    app_id: AppId,
    overlay: Arc<Overlay>,
    picker: Arc<dyn ColorPicker>,
    writes: mpsc::UnboundedSender<QueuedWrite>,
    events: Arc<InMemoryEventBus<WriteEvent>>,
}

impl<S> Clone for BeaverStore<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            app_id: self.app_id,
            overlay: self.overlay.clone(),
            picker: self.picker.clone(),
            writes: self.writes.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S> BeaverStore<S>
where
    S: SyncService + 'static,
{
    /// Connect a store to `app_id` through `service`.
    ///
    /// Spawns the writer task, so this must run inside a Tokio runtime. The
    /// task stops once every clone of the store is dropped.
    pub fn new(service: Arc<S>, app_id: AppId) -> Self {
        let overlay = Arc::new(Overlay::new());
        let events = Arc::new(InMemoryEventBus::new());
        let (writes, queue) = mpsc::unbounded_channel();

        tokio::spawn(run_writer(
            service.clone(),
            app_id,
            overlay.clone(),
            events.clone(),
            queue,
        ));

        tracing::info!(%app_id, "beaver store connected");

        Self {
            service,
            app_id,
            overlay,
            picker: Arc::new(RandomColorPicker),
            writes,
            events,
        }
    }

    pub fn with_color_picker(mut self, picker: impl ColorPicker + 'static) -> Self {
        self.picker = Arc::new(picker);
        self
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Live view of the whole collection. Each call opens a fresh subscription.
    pub fn subscribe_to_all(&self) -> SnapshotStream<S> {
        SnapshotStream::new(self.service.clone(), self.app_id, self.overlay.clone())
    }

    /// Create a beaver named `name` with a fresh id, a palette color and the current time.
    pub fn create_beaver(&self, name: BeaverName) -> PendingWrite {
        let beaver = Beaver::create(name, self.picker.as_ref(), Utc::now());
        tracing::debug!(id = %beaver.id(), color = %beaver.color(), "creating beaver");
        self.submit(Transaction::create(beaver))
    }

    /// Delete one beaver. Deleting an absent id is a no-op.
    pub fn delete_beaver(&self, id: BeaverId) -> PendingWrite {
        self.submit(Transaction::delete(id))
    }

    /// Delete every id in `ids` as a single atomic transaction.
    pub fn delete_all_beavers(&self, ids: impl IntoIterator<Item = BeaverId>) -> PendingWrite {
        self.submit(Transaction::delete_all(ids))
    }

    /// Outcomes of every write settled from now on.
    pub fn write_events(&self) -> Subscription<WriteEvent> {
        self.events.subscribe()
    }

    /// Writes submitted through this store that remote state does not reflect yet.
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    fn submit(&self, tx: Transaction) -> PendingWrite {
        let tx_id = tx.id();
        let ids = tx.ops().iter().map(|op| op.target()).collect();
        let (reply, outcome) = oneshot::channel();

        self.overlay.push(tx.clone());

        if let Err(mpsc::error::SendError(rejected)) = self.writes.send(QueuedWrite { tx, reply }) {
            tracing::warn!(%tx_id, "writer task is gone; dropping transaction");
            self.overlay.discard(tx_id);
            let _ = rejected.reply.send(Err(WriteError::Dropped));
        }

        PendingWrite {
            tx_id,
            ids,
            reply: outcome,
        }
    }
}

async fn run_writer<S>(
    service: Arc<S>,
    app_id: AppId,
    overlay: Arc<Overlay>,
    events: Arc<InMemoryEventBus<WriteEvent>>,
    mut queue: mpsc::UnboundedReceiver<QueuedWrite>,
) where
    S: SyncService + 'static,
{
    while let Some(QueuedWrite { tx, reply }) = queue.recv().await {
        let tx_id = tx.id();
        let ops = tx.len();

        let result = service.submit(app_id, tx).await.map_err(WriteError::from);

        let event = match &result {
            Ok(receipt) => {
                overlay.confirm(tx_id, receipt.version);
                tracing::debug!(%tx_id, ops, version = receipt.version, "transaction committed");
                WriteEvent::Committed {
                    tx_id,
                    ops,
                    version: receipt.version,
                }
            }
            Err(err) => {
                overlay.discard(tx_id);
                tracing::warn!(%tx_id, ops, error = %err, "transaction failed; rolled back");
                WriteEvent::Failed {
                    tx_id,
                    ops,
                    error: err.to_string(),
                }
            }
        };

        if let Err(err) = events.publish(event) {
            tracing::warn!(%tx_id, "failed to publish write outcome: {err:?}");
        }

        // The caller may have dropped its handle; that is fine.
        let _ = reply.send(result);
    }

    tracing::debug!(%app_id, "writer task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhvr_core::FixedColorPicker;
    use bhvr_infra::InMemorySyncService;
    use std::time::Duration;

    fn name(s: &str) -> BeaverName {
        BeaverName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_commits_through_the_service() {
        let svc = Arc::new(InMemorySyncService::new());
        let app = AppId::new();
        let store = BeaverStore::new(svc.clone(), app).with_color_picker(FixedColorPicker(4));

        let write = store.create_beaver(name("Rocky"));
        let id = write.ids()[0];
        let receipt = write.outcome().await.unwrap();

        assert_eq!(receipt.version, 1);
        let records = svc.records(app);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), id);
        assert_eq!(records[0].color().as_str(), "#B8860B");
    }

    #[tokio::test]
    async fn writes_return_before_the_service_answers() {
        let svc = Arc::new(InMemorySyncService::new().with_latency(Duration::from_millis(200)));
        let store = BeaverStore::new(svc.clone(), AppId::new());

        let write = store.create_beaver(name("Slow"));

        assert_eq!(store.pending_writes(), 1);
        assert!(svc.records(store.app_id()).is_empty());
        write.outcome().await.unwrap();
    }

    #[tokio::test]
    async fn failed_write_is_reported_on_handle_and_bus() {
        let svc = Arc::new(InMemorySyncService::new());
        let store = BeaverStore::new(svc.clone(), AppId::new());
        let mut events = store.write_events();
        svc.fail_next_submits(1);

        // A UI task waiting on the bus before anything has been published.
        let watcher = tokio::spawn(async move { events.recv().await });
        tokio::task::yield_now().await;

        let write = store.create_beaver(name("Doomed"));
        let tx_id = write.tx_id();
        let err = write.outcome().await.unwrap_err();

        assert!(matches!(err, WriteError::Service(SyncServiceError::Rejected(_))));
        assert_eq!(store.pending_writes(), 0);
        let event = tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(event.is_failure());
        assert_eq!(event.tx_id(), tx_id);
    }

    #[tokio::test]
    async fn writes_are_submitted_in_call_order() {
        let svc = Arc::new(InMemorySyncService::new().with_latency(Duration::from_millis(5)));
        let app = AppId::new();
        let store = BeaverStore::new(svc.clone(), app);

        let create = store.create_beaver(name("Ephemeral"));
        let id = create.ids()[0];
        let delete = store.delete_beaver(id);

        create.outcome().await.unwrap();
        let receipt = delete.outcome().await.unwrap();

        assert_eq!(receipt.version, 2);
        assert!(svc.records(app).is_empty());
    }

    #[tokio::test]
    async fn delete_all_goes_out_as_one_transaction() {
        let svc = Arc::new(InMemorySyncService::new());
        let app = AppId::new();
        let store = BeaverStore::new(svc.clone(), app);
        let mut ids = Vec::new();
        for n in ["A", "B", "C"] {
            let w = store.create_beaver(name(n));
            ids.push(w.ids()[0]);
            w.outcome().await.unwrap();
        }
        assert_eq!(svc.version(app), 3);

        let write = store.delete_all_beavers(ids.clone());
        assert_eq!(write.ids(), ids.as_slice());
        write.outcome().await.unwrap();

        assert!(svc.records(app).is_empty());
        assert_eq!(svc.version(app), 4);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_an_error() {
        let svc = Arc::new(InMemorySyncService::new());
        let store = BeaverStore::new(svc.clone(), AppId::new());
        let create = store.create_beaver(name("Bob"));
        let id = create.ids()[0];
        create.outcome().await.unwrap();

        let first = store.delete_beaver(id).outcome().await.unwrap();
        let second = store.delete_beaver(id).outcome().await.unwrap();

        assert_eq!(first.version, second.version);
    }
}
