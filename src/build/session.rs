// src/build/session.rs

//! Per-process watch session state.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::types::AssetCategory;

/// Explicit "since last successful run" bookkeeping, threaded through the
/// scheduler instead of living in ambient module state.
///
/// Created at startup, updated only after a batch completes in full, never
/// persisted: a crash mid-batch leaves the watermark untouched so affected
/// paths are re-considered on the next trigger (at-least-once).
#[derive(Debug)]
pub struct WatchSession {
    started_at: SystemTime,
    last_run: HashMap<AssetCategory, SystemTime>,
}

impl WatchSession {
    pub fn new() -> Self {
        Self {
            started_at: SystemTime::now(),
            last_run: HashMap::new(),
        }
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Watermark for a category, `None` until its first completed batch.
    pub fn last_run(&self, category: AssetCategory) -> Option<SystemTime> {
        self.last_run.get(&category).copied()
    }

    /// Record a completed batch for the given categories.
    ///
    /// `completed_at` should be the batch *start* time: a source change that
    /// races the batch then stays ahead of the watermark and is rebuilt
    /// again rather than silently skipped.
    pub fn record_batch(
        &mut self,
        categories: impl IntoIterator<Item = AssetCategory>,
        completed_at: SystemTime,
    ) {
        for category in categories {
            self.last_run.insert(category, completed_at);
        }
    }
}

impl Default for WatchSession {
    fn default() -> Self {
        Self::new()
    }
}
