//! `bhvr-client`
//!
//! **Responsibility:** the reactive record store client of the beaver manager.
//!
//! This crate provides:
//! - A live, subscribed view of the shared `beavers` collection (`SnapshotStream`)
//! - Optimistic create/delete transactions with observable outcomes (`BeaverStore`)
//! - The demo call to the companion backend (`HelloClient`)
//! - Presentation view models (`view`)
//!
//! The service handle is always injected; nothing here is a global.

pub mod api_client;
mod overlay;
pub mod store;
pub mod subscription;
pub mod view;

pub use api_client::{ApiClientError, HelloClient};
pub use store::{BeaverStore, PendingWrite, WriteError};
pub use subscription::SnapshotStream;
pub use view::{BeaverForm, BeaverRow, ManagerView, Screen};
