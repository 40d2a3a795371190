//! `bhvr-core`: domain building blocks for the beaver manager.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the `Beaver` record, the color palette and the payload shared
//! with the companion backend.

pub mod api;
pub mod beaver;
pub mod error;
pub mod id;
pub mod palette;

pub use api::ApiResponse;
pub use beaver::{Beaver, BeaverName};
pub use error::{DomainError, DomainResult};
pub use id::{AppId, BeaverId};
pub use palette::{Color, ColorPicker, FixedColorPicker, PALETTE, RandomColorPicker};
