use std::sync::Arc;

use async_trait::async_trait;
use bhvr_core::{AppId, Beaver};
use bhvr_events::{Transaction, TxReceipt};
use thiserror::Error;
use tokio::sync::mpsc;

/// Which records of the `beavers` collection a subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CollectionFilter {
    /// The whole, unfiltered collection.
    #[default]
    All,
}

impl CollectionFilter {
    pub fn matches(&self, _beaver: &Beaver) -> bool {
        match self {
            CollectionFilter::All => true,
        }
    }
}

/// A message pushed by the service to one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// Full current state of the subscribed records at namespace `version`.
    Snapshot { version: u64, records: Vec<Beaver> },
    /// The subscription failed; nothing follows.
    Failed(String),
}

/// Receiving half of a service subscription.
///
/// Holding it keeps the connection alive. Dropping it releases the
/// connection: the service notices the closed channel and forgets the
/// subscriber.
#[derive(Debug)]
pub struct RemoteSubscription {
    receiver: mpsc::UnboundedReceiver<RemoteEvent>,
}

impl RemoteSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<RemoteEvent>) -> Self {
        Self { receiver }
    }

    /// Wait for the next pushed event. `None` once the service side is gone.
    pub async fn recv(&mut self) -> Option<RemoteEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<RemoteEvent> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncServiceError {
    /// The service cannot be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The batch clashes with stored state (e.g. an id that already exists).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The service refused the batch.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The connection was closed before an answer arrived.
    #[error("connection closed")]
    Closed,
}

/// The hosted record-sync service, as seen by a client.
///
/// Implementations must:
/// - push the current state right after a subscription opens, then a new
///   snapshot after every commit that changes the namespace;
/// - apply each submitted transaction atomically (all operations or none);
/// - treat deletes of absent ids as no-ops.
#[async_trait]
pub trait SyncService: Send + Sync {
    async fn subscribe(
        &self,
        app_id: AppId,
        filter: CollectionFilter,
    ) -> Result<RemoteSubscription, SyncServiceError>;

    async fn submit(&self, app_id: AppId, tx: Transaction) -> Result<TxReceipt, SyncServiceError>;
}

#[async_trait]
impl<S> SyncService for Arc<S>
where
    S: SyncService + ?Sized,
{
    async fn subscribe(
        &self,
        app_id: AppId,
        filter: CollectionFilter,
    ) -> Result<RemoteSubscription, SyncServiceError> {
        (**self).subscribe(app_id, filter).await
    }

    async fn submit(&self, app_id: AppId, tx: Transaction) -> Result<TxReceipt, SyncServiceError> {
        (**self).submit(app_id, tx).await
    }
}
