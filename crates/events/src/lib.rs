//! Transactions, snapshots and write outcomes, plus the pub/sub mechanics used
//! to fan them out.

pub mod bus;
pub mod in_memory_bus;
pub mod snapshot;
pub mod transaction;
pub mod write_event;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use snapshot::CollectionSnapshot;
pub use transaction::{Transaction, TxOp, TxReceipt};
pub use write_event::WriteEvent;
