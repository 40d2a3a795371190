use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bhvr_core::{AppId, Beaver, BeaverId};
use bhvr_events::{Transaction, TxOp, TxReceipt};
use tokio::sync::mpsc;

use super::r#trait::{
    CollectionFilter, RemoteEvent, RemoteSubscription, SyncService, SyncServiceError,
};

#[derive(Debug)]
struct Subscriber {
    filter: CollectionFilter,
    sender: mpsc::UnboundedSender<RemoteEvent>,
}

impl Subscriber {
    fn push_state(&self, version: u64, records: &HashMap<BeaverId, Beaver>) -> bool {
        let visible = records
            .values()
            .filter(|b| self.filter.matches(b))
            .cloned()
            .collect();
        self.sender
            .send(RemoteEvent::Snapshot { version, records: visible })
            .is_ok()
    }
}

/// One hosted collection (per `AppId`).
#[derive(Debug, Default)]
struct Namespace {
    records: HashMap<BeaverId, Beaver>,
    /// Every id ever deleted. Ids are never reused.
    retired: HashSet<BeaverId>,
    version: u64,
    subscribers: Vec<Subscriber>,
}

impl Namespace {
    fn validate(&self, tx: &Transaction) -> Result<(), SyncServiceError> {
        let mut created = HashSet::new();
        for op in tx.ops() {
            if let TxOp::Create { beaver } = op {
                let id = beaver.id();
                if self.records.contains_key(&id) || self.retired.contains(&id) || !created.insert(id) {
                    return Err(SyncServiceError::Conflict(format!("beaver {id} already exists")));
                }
            }
        }
        Ok(())
    }

    /// Apply a validated transaction; returns whether anything changed.
    fn commit(&mut self, tx: &Transaction) -> bool {
        let mut changed = false;
        for op in tx.ops() {
            match op {
                TxOp::Create { beaver } => {
                    self.records.insert(beaver.id(), beaver.clone());
                    changed = true;
                }
                TxOp::Delete { id } => {
                    if self.records.remove(id).is_some() {
                        self.retired.insert(*id);
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.version += 1;
        }
        changed
    }

    fn broadcast(&mut self) {
        let (version, records) = (self.version, &self.records);
        self.subscribers.retain(|s| s.push_state(version, records));
    }
}

/// Process-local stand-in for the hosted realtime database.
///
/// - Namespaces are isolated by `AppId`
/// - Commits are serialized by one lock; every commit fans out a full
///   snapshot to every live subscriber of the namespace
/// - Faults can be injected for tests (unavailability, failing submits,
///   broken subscriptions, latency)
#[derive(Debug, Default)]
pub struct InMemorySyncService {
    namespaces: Mutex<HashMap<AppId, Namespace>>,
    unavailable: AtomicBool,
    failing_submits: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl InMemorySyncService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every submit by `latency` before it commits.
    pub fn with_latency(self, latency: Duration) -> Self {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = Some(latency);
        }
        self
    }

    /// While set, subscribe and submit fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Reject the next `n` submits (after latency, before commit).
    pub fn fail_next_submits(&self, n: usize) {
        self.failing_submits.store(n, Ordering::SeqCst);
    }

    /// Fail every live subscription of `app_id` with `reason`.
    pub fn break_subscriptions(&self, app_id: AppId, reason: &str) {
        let Ok(mut namespaces) = self.namespaces.lock() else {
            return;
        };
        if let Some(ns) = namespaces.get_mut(&app_id) {
            for sub in ns.subscribers.drain(..) {
                let _ = sub.sender.send(RemoteEvent::Failed(reason.to_string()));
            }
            tracing::info!(%app_id, reason, "broke all subscriptions");
        }
    }

    /// Subscriptions of `app_id` whose receiving side is still alive.
    pub fn live_subscriptions(&self, app_id: AppId) -> usize {
        let Ok(mut namespaces) = self.namespaces.lock() else {
            return 0;
        };
        match namespaces.get_mut(&app_id) {
            Some(ns) => {
                ns.subscribers.retain(|s| !s.sender.is_closed());
                ns.subscribers.len()
            }
            None => 0,
        }
    }

    /// Current records of `app_id`, in no particular order.
    pub fn records(&self, app_id: AppId) -> Vec<Beaver> {
        self.namespaces
            .lock()
            .ok()
            .and_then(|n| n.get(&app_id).map(|ns| ns.records.values().cloned().collect()))
            .unwrap_or_default()
    }

    /// Number of committed, state-changing transactions in `app_id`.
    pub fn version(&self, app_id: AppId) -> u64 {
        self.namespaces
            .lock()
            .ok()
            .and_then(|n| n.get(&app_id).map(|ns| ns.version))
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), SyncServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncServiceError::Unavailable("service marked unavailable".to_string()));
        }
        Ok(())
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_submits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn poisoned() -> SyncServiceError {
        SyncServiceError::Unavailable("namespace lock poisoned".to_string())
    }
}

#[async_trait]
impl SyncService for InMemorySyncService {
    async fn subscribe(
        &self,
        app_id: AppId,
        filter: CollectionFilter,
    ) -> Result<RemoteSubscription, SyncServiceError> {
        self.check_available()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber = Subscriber { filter, sender };

        let mut namespaces = self.namespaces.lock().map_err(|_| Self::poisoned())?;
        let ns = namespaces.entry(app_id).or_default();

        // Current state goes out before any later commit can.
        subscriber.push_state(ns.version, &ns.records);
        ns.subscribers.push(subscriber);

        tracing::debug!(%app_id, subscribers = ns.subscribers.len(), "subscription opened");
        Ok(RemoteSubscription::new(receiver))
    }

    async fn submit(&self, app_id: AppId, tx: Transaction) -> Result<TxReceipt, SyncServiceError> {
        self.check_available()?;

        let latency = self.latency.lock().ok().and_then(|l| *l);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_injected_failure() {
            return Err(SyncServiceError::Rejected("injected submit failure".to_string()));
        }

        let mut namespaces = self.namespaces.lock().map_err(|_| Self::poisoned())?;
        let ns = namespaces.entry(app_id).or_default();

        ns.validate(&tx)?;
        if ns.commit(&tx) {
            ns.broadcast();
            tracing::debug!(%app_id, tx_id = %tx.id(), ops = tx.len(), version = ns.version, "transaction committed");
        }

        Ok(TxReceipt {
            tx_id: tx.id(),
            version: ns.version,
        })
    }
}
