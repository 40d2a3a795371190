//! Record-sync service boundary.
//!
//! The hosted realtime database is consumed through two primitives only:
//! `subscribe` (a push channel of snapshots) and `submit` (an atomic batch of
//! creates/deletes). This module defines that seam without assuming anything
//! about the transport behind it.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemorySyncService;
pub use r#trait::{CollectionFilter, RemoteEvent, RemoteSubscription, SyncService, SyncServiceError};
