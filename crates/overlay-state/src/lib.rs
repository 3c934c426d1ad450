//! overlay-state: persistent store for declared custom overlays.
//!
//! Backed by [redb](https://docs.rs/redb). Each declared overlay is one row
//! in the `custom_overlays` table: the overlay name as key, the JSON body as
//! value (member order preserved).
//!
//! The reconciler only sees the [`OverlayStore`] trait, so tests and tools
//! can swap in [`StateStore::open_in_memory`] or their own backend.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::{FileStore, OverlayStore, StateStore};
