//! Local transactions not yet reflected in remote state.
//!
//! Every `Ready` snapshot a client renders is the last remote state with the
//! overlay replayed on top, so a write shows up before the service answers.
//! An entry leaves the overlay when it fails (rollback), once a remote
//! snapshot at or past its commit version has been observed, or, once
//! confirmed, when no stream is left watching.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use bhvr_core::{Beaver, BeaverId};
use bhvr_events::Transaction;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug)]
struct Entry {
    tx: Transaction,
    /// Namespace version the service committed this at, once confirmed.
    confirmed_at: Option<u64>,
}

impl Entry {
    fn visible_over(&self, base_version: u64) -> bool {
        self.confirmed_at.is_none_or(|v| v > base_version)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Entry>,
    observed_version: u64,
}

#[derive(Debug)]
pub(crate) struct Overlay {
    inner: Mutex<Inner>,
    revision: watch::Sender<u64>,
}

impl Overlay {
    pub(crate) fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner::default()),
            revision,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// With no stream left to observe remote versions, confirmed entries are
    /// already part of remote state and only the unconfirmed ones matter.
    fn prune_unwatched(&self, inner: &mut Inner) {
        if self.revision.receiver_count() == 0 {
            inner.entries.retain(|e| e.confirmed_at.is_none());
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    /// Receiver that changes whenever the overlay does.
    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub(crate) fn push(&self, tx: Transaction) {
        self.inner().entries.push(Entry {
            tx,
            confirmed_at: None,
        });
        self.bump();
    }

    /// The service committed `tx_id` at `version`.
    pub(crate) fn confirm(&self, tx_id: Uuid, version: u64) {
        {
            let mut inner = self.inner();
            let seen = version <= inner.observed_version;
            if let Some(pos) = inner.entries.iter().position(|e| e.tx.id() == tx_id) {
                // Empty transactions never change remote state, so no snapshot will carry them.
                if seen || inner.entries[pos].tx.is_empty() {
                    inner.entries.remove(pos);
                } else {
                    inner.entries[pos].confirmed_at = Some(version);
                }
            }
            self.prune_unwatched(&mut inner);
        }
        self.bump();
    }

    /// The service refused `tx_id`: forget it, which rolls the change back.
    pub(crate) fn discard(&self, tx_id: Uuid) {
        self.inner().entries.retain(|e| e.tx.id() != tx_id);
        self.bump();
    }

    /// A remote snapshot at `version` arrived; confirmed entries it covers are dropped.
    pub(crate) fn observe(&self, version: u64) {
        let mut inner = self.inner();
        inner.observed_version = inner.observed_version.max(version);
        let observed = inner.observed_version;
        inner.entries.retain(|e| e.confirmed_at.is_none_or(|v| v > observed));
    }

    /// Remote `base` (at `base_version`) with the overlay replayed in submission order.
    pub(crate) fn merge(&self, base: &HashMap<BeaverId, Beaver>, base_version: u64) -> Vec<Beaver> {
        let mut records = base.clone();
        for entry in self.inner().entries.iter().filter(|e| e.visible_over(base_version)) {
            entry.tx.apply(&mut records);
        }
        records.into_values().collect()
    }

    /// Entries remote state may not reflect yet.
    pub(crate) fn len(&self) -> usize {
        let mut inner = self.inner();
        self.prune_unwatched(&mut inner);
        inner.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhvr_core::{BeaverName, FixedColorPicker};
    use chrono::Utc;

    fn beaver(name: &str) -> Beaver {
        Beaver::create(BeaverName::parse(name).unwrap(), &FixedColorPicker(0), Utc::now())
    }

    fn names(records: &[Beaver]) -> Vec<String> {
        let mut names: Vec<_> = records.iter().map(|b| b.name().to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn pending_create_is_visible_over_empty_base() {
        let overlay = Overlay::new();
        overlay.push(Transaction::create(beaver("Rocky")));

        let merged = overlay.merge(&HashMap::new(), 0);
        assert_eq!(names(&merged), vec!["Rocky"]);
    }

    #[test]
    fn pending_delete_hides_remote_record() {
        let bob = beaver("Bob");
        let base = HashMap::from([(bob.id(), bob.clone())]);
        let overlay = Overlay::new();
        overlay.push(Transaction::delete(bob.id()));

        assert!(overlay.merge(&base, 1).is_empty());
    }

    #[test]
    fn discard_rolls_back() {
        let overlay = Overlay::new();
        let tx = Transaction::create(beaver("Rocky"));
        let tx_id = tx.id();
        overlay.push(tx);

        overlay.discard(tx_id);

        assert!(overlay.merge(&HashMap::new(), 0).is_empty());
        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn confirmed_entry_stays_until_remote_catches_up() {
        let overlay = Overlay::new();
        let _rx = overlay.watch();
        let tx = Transaction::create(beaver("Rocky"));
        let tx_id = tx.id();
        overlay.push(tx);
        overlay.confirm(tx_id, 3);

        // An older remote snapshot still needs the overlay.
        assert_eq!(overlay.merge(&HashMap::new(), 2).len(), 1);
        // A snapshot at the commit version already carries it.
        assert!(overlay.merge(&HashMap::new(), 3).is_empty());

        overlay.observe(3);
        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn confirm_without_watchers_drops_immediately() {
        let overlay = Overlay::new();
        let tx = Transaction::create(beaver("Rocky"));
        let tx_id = tx.id();
        overlay.push(tx);

        overlay.confirm(tx_id, 1);

        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn entries_confirmed_while_watched_go_once_the_last_watcher_leaves() {
        let overlay = Overlay::new();
        let rx = overlay.watch();
        let tx = Transaction::create(beaver("Rocky"));
        let tx_id = tx.id();
        overlay.push(tx);
        overlay.confirm(tx_id, 1);
        assert_eq!(overlay.len(), 1);

        drop(rx);

        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn unconfirmed_entries_survive_without_watchers() {
        let overlay = Overlay::new();
        overlay.push(Transaction::create(beaver("Rocky")));

        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn confirm_at_already_observed_version_drops_immediately() {
        let overlay = Overlay::new();
        let _rx = overlay.watch();
        overlay.observe(5);
        let tx = Transaction::delete(BeaverId::new());
        let tx_id = tx.id();
        overlay.push(tx);

        overlay.confirm(tx_id, 5);

        assert_eq!(overlay.len(), 0);
    }

    #[test]
    fn every_change_bumps_revision() {
        let overlay = Overlay::new();
        let mut rx = overlay.watch();
        let tx = Transaction::create(beaver("A"));
        let tx_id = tx.id();

        overlay.push(tx);
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        overlay.discard(tx_id);
        assert!(rx.has_changed().unwrap());
    }

    proptest::proptest! {
        #[test]
        fn merge_shows_exactly_the_surviving_creates(keep in proptest::collection::vec(proptest::bool::ANY, 0..12)) {
            let overlay = Overlay::new();
            let mut expected = Vec::new();
            for (i, keep) in keep.iter().enumerate() {
                let b = beaver(&format!("b{i}"));
                let tx = Transaction::create(b.clone());
                let tx_id = tx.id();
                overlay.push(tx);
                if *keep {
                    expected.push(b.id());
                } else {
                    overlay.discard(tx_id);
                }
            }

            let mut merged: Vec<_> = overlay.merge(&HashMap::new(), 0).iter().map(Beaver::id).collect();
            merged.sort();
            expected.sort();
            proptest::prop_assert_eq!(merged, expected);
        }
    }
}
