//! Write transactions against the beaver collection.

use std::collections::HashMap;

use bhvr_core::{Beaver, BeaverId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One operation inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum TxOp {
    Create { beaver: Beaver },
    Delete { id: BeaverId },
}

impl TxOp {
    pub fn target(&self) -> BeaverId {
        match self {
            TxOp::Create { beaver } => beaver.id(),
            TxOp::Delete { id } => *id,
        }
    }

    /// Apply without any checks: creates insert, deletes of absent ids do nothing.
    ///
    /// This is the optimistic view a client renders before the service answers.
    pub fn apply(&self, records: &mut HashMap<BeaverId, Beaver>) {
        match self {
            TxOp::Create { beaver } => {
                records.entry(beaver.id()).or_insert_with(|| beaver.clone());
            }
            TxOp::Delete { id } => {
                records.remove(id);
            }
        }
    }
}

/// A batch of operations submitted atomically: all apply or none do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
    ops: Vec<TxOp>,
}

impl Transaction {
    pub fn new(ops: Vec<TxOp>) -> Self {
        Self {
            id: Uuid::now_v7(),
            ops,
        }
    }

    pub fn create(beaver: Beaver) -> Self {
        Self::new(vec![TxOp::Create { beaver }])
    }

    pub fn delete(id: BeaverId) -> Self {
        Self::new(vec![TxOp::Delete { id }])
    }

    /// One transaction holding a delete per id (duplicates collapsed, first wins).
    pub fn delete_all(ids: impl IntoIterator<Item = BeaverId>) -> Self {
        let mut ops: Vec<TxOp> = Vec::new();
        for id in ids {
            if !ops.iter().any(|op| op.target() == id) {
                ops.push(TxOp::Delete { id });
            }
        }
        Self::new(ops)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn ops(&self) -> &[TxOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn apply(&self, records: &mut HashMap<BeaverId, Beaver>) {
        for op in &self.ops {
            op.apply(records);
        }
    }
}

/// Acknowledgement of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_id: Uuid,
    /// Collection version after the commit. Empty transactions leave it unchanged.
    pub version: u64,
}
