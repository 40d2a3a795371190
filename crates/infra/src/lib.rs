//! Infrastructure layer: the hosted record-sync service boundary and config.

pub mod config;
pub mod sync_service;

pub use config::{ClientConfig, ConfigError};
pub use sync_service::{
    CollectionFilter, InMemorySyncService, RemoteEvent, RemoteSubscription, SyncService,
    SyncServiceError,
};
