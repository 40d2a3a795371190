use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one submitted transaction, published once it settles.
///
/// Observers that do not hold the `PendingWrite` (a toast area, a status bar)
/// learn about failures through these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteEvent {
    Committed { tx_id: Uuid, ops: usize, version: u64 },
    Failed { tx_id: Uuid, ops: usize, error: String },
}

impl WriteEvent {
    pub fn tx_id(&self) -> Uuid {
        match self {
            WriteEvent::Committed { tx_id, .. } | WriteEvent::Failed { tx_id, .. } => *tx_id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, WriteEvent::Failed { .. })
    }
}
