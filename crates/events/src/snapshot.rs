//! Point-in-time views of the subscribed collection.

use bhvr_core::{Beaver, BeaverId};
use serde::{Deserialize, Serialize};

/// What a subscriber sees at one instant.
///
/// A subscription emits `Loading` first, then `Ready` on every change, and
/// at most one `Error`, after which it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum CollectionSnapshot {
    Loading,
    Error(String),
    Ready(Vec<Beaver>),
}

impl CollectionSnapshot {
    /// A `Ready` snapshot ordered by `(created_at, id)`.
    ///
    /// The collection itself has no order; sorting only keeps rendering stable.
    pub fn ready(records: impl IntoIterator<Item = Beaver>) -> Self {
        let mut records: Vec<Beaver> = records.into_iter().collect();
        records.sort_by_key(|b| (b.created_at(), b.id()));
        CollectionSnapshot::Ready(records)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CollectionSnapshot::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn records(&self) -> Option<&[Beaver]> {
        match self {
            CollectionSnapshot::Ready(records) => Some(records),
            _ => None,
        }
    }

    /// Ids of a `Ready` snapshot; empty otherwise.
    pub fn ids(&self) -> Vec<BeaverId> {
        self.records()
            .map(|r| r.iter().map(Beaver::id).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhvr_core::Color;
    use chrono::{Duration, Utc};

    #[test]
    fn ready_orders_by_creation_time() {
        let now = Utc::now();
        let late = Beaver::new(BeaverId::new(), "late", Color::from_palette(0), now);
        let early = Beaver::new(BeaverId::new(), "early", Color::from_palette(1), now - Duration::seconds(5));

        let snap = CollectionSnapshot::ready(vec![late.clone(), early.clone()]);

        assert_eq!(snap.ids(), vec![early.id(), late.id()]);
    }

    #[test]
    fn non_ready_snapshots_have_no_records() {
        assert!(CollectionSnapshot::Loading.records().is_none());
        let err = CollectionSnapshot::Error("boom".into());
        assert_eq!(err.error(), Some("boom"));
        assert!(err.ids().is_empty());
    }
}
