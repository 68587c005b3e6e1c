// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - wiring up cross-platform filesystem watchers (`notify`), one
//!   subscription per configured watch root;
//! - collapsing bursts of events for the same path into a single
//!   notification within the debounce window;
//! - resubscribing a root whose provider subscription errors.
//!
//! It performs **no** classification or transform logic; it only turns raw
//! filesystem events into a deduplicated change batch for the runtime.

pub mod coalesce;
pub mod path_utils;
pub mod watcher;

pub use coalesce::Coalescer;
pub use watcher::{WatcherHandle, spawn_watchers};
