// src/engine/mod.rs

//! Orchestration engine for assetwatch.
//!
//! The runtime is a thin async shell: it reads [`RuntimeEvent`]s from a
//! channel, hands change batches to the scheduler (the pure planning lives
//! in `build::plan`), and passes each report to the reload broadcaster.
//! Watchers, Ctrl-C handling and the transport all talk to it exclusively
//! through the event channel.

use crate::types::ChangeKind;

/// Events flowing into the runtime from watchers and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A debounced batch of filesystem changes, paths relative to the
    /// source root.
    ChangesDetected(Vec<(ChangeKind, String)>),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod runtime;

pub use runtime::Runtime;
