//! Subscribed query over the whole collection.

use std::collections::HashMap;
use std::sync::Arc;

use bhvr_core::{AppId, Beaver, BeaverId};
use bhvr_events::CollectionSnapshot;
use bhvr_infra::{CollectionFilter, RemoteEvent, RemoteSubscription, SyncService};
use tokio::sync::watch;

use crate::overlay::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing emitted yet.
    Start,
    /// `Loading` emitted; the remote subscription opens on the next poll.
    Connecting,
    /// Subscribed; emits `Ready` on every remote or local change.
    Live,
    /// `Error` emitted; the stream is over.
    Closed,
}

enum Change {
    Remote(Option<RemoteEvent>),
    Local(bool),
}

/// Lazy, restartable stream of [`CollectionSnapshot`]s.
///
/// Lifecycle: `Loading`, then `Ready` whenever remote state or this client's
/// optimistic overlay changes, until an `Error` ends it. Consecutive identical
/// `Ready` snapshots are coalesced. Dropping the stream releases its remote
/// subscription; there is no automatic reconnect, open a new stream instead.
///
/// ```ignore
/// let mut beavers = store.subscribe_to_all();
/// while let Some(snapshot) = beavers.next().await {
///     render(&ManagerView::from_snapshot(&snapshot));
/// }
/// ```
pub struct SnapshotStream<S> {
    service: Arc<S>,
    app_id: AppId,
    overlay: Arc<Overlay>,
    revision: watch::Receiver<u64>,
    local_open: bool,
    phase: Phase,
    remote: Option<RemoteSubscription>,
    base: Option<(u64, HashMap<BeaverId, Beaver>)>,
    last_emitted: Option<CollectionSnapshot>,
}

impl<S> SnapshotStream<S>
where
    S: SyncService + 'static,
{
    pub(crate) fn new(service: Arc<S>, app_id: AppId, overlay: Arc<Overlay>) -> Self {
        let revision = overlay.watch();
        Self {
            service,
            app_id,
            overlay,
            revision,
            local_open: true,
            phase: Phase::Start,
            remote: None,
            base: None,
            last_emitted: None,
        }
    }

    /// Whether the stream is subscribed and delivering updates.
    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Wait for the next snapshot. `None` after the stream has ended.
    pub async fn next(&mut self) -> Option<CollectionSnapshot> {
        loop {
            match self.phase {
                Phase::Start => {
                    self.phase = Phase::Connecting;
                    return Some(CollectionSnapshot::Loading);
                }
                Phase::Connecting => {
                    match self.service.subscribe(self.app_id, CollectionFilter::All).await {
                        Ok(remote) => {
                            tracing::debug!(app_id = %self.app_id, "snapshot stream subscribed");
                            self.remote = Some(remote);
                            self.phase = Phase::Live;
                        }
                        Err(err) => return Some(self.fail(err.to_string())),
                    }
                }
                Phase::Live => {
                    let listen_local = self.local_open && self.base.is_some();

                    // Remote first, so local churn never starves remote delivery.
                    let change = match self.remote.as_mut() {
                        Some(remote) => tokio::select! {
                            biased;
                            event = remote.recv() => Change::Remote(event),
                            res = self.revision.changed(), if listen_local => Change::Local(res.is_ok()),
                        },
                        None => Change::Remote(None),
                    };

                    match change {
                        Change::Remote(Some(RemoteEvent::Snapshot { version, records })) => {
                            self.overlay.observe(version);
                            let base = records.into_iter().map(|b| (b.id(), b)).collect();
                            self.base = Some((version, base));
                        }
                        Change::Remote(Some(RemoteEvent::Failed(reason))) => {
                            return Some(self.fail(reason));
                        }
                        Change::Remote(None) => {
                            return Some(self.fail("subscription closed by service".to_string()));
                        }
                        Change::Local(true) => {}
                        Change::Local(false) => {
                            self.local_open = false;
                            continue;
                        }
                    }

                    if let Some(snapshot) = self.render() {
                        return Some(snapshot);
                    }
                }
                Phase::Closed => return None,
            }
        }
    }

    /// Current merged view, unless it equals what was last emitted.
    fn render(&mut self) -> Option<CollectionSnapshot> {
        let (version, base) = self.base.as_ref()?;
        let snapshot = CollectionSnapshot::ready(self.overlay.merge(base, *version));
        if self.last_emitted.as_ref() == Some(&snapshot) {
            return None;
        }
        tracing::debug!(app_id = %self.app_id, records = snapshot.ids().len(), "snapshot emitted");
        self.last_emitted = Some(snapshot.clone());
        Some(snapshot)
    }

    fn fail(&mut self, reason: String) -> CollectionSnapshot {
        tracing::warn!(app_id = %self.app_id, %reason, "snapshot stream failed");
        self.remote = None;
        self.base = None;
        self.phase = Phase::Closed;
        CollectionSnapshot::Error(reason)
    }
}
