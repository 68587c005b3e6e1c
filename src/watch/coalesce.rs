// src/watch/coalesce.rs

//! Pure debounce/coalescing state machine.
//!
//! Events for the same path arriving within one window collapse into a
//! single notification carrying the latest kind, with one exception: a
//! removal followed by re-creation is a net content change.

use crate::types::ChangeKind;

/// Collapse a newly observed kind into the pending kind for a path.
pub fn merge_kinds(prev: ChangeKind, next: ChangeKind) -> ChangeKind {
    match (prev, next) {
        (ChangeKind::Unlink, ChangeKind::Add) => ChangeKind::Change,
        (_, next) => next,
    }
}

/// Pending changes for the current debounce window.
///
/// Paths keep first-seen order so batches stay deterministic.
#[derive(Debug, Default)]
pub struct Coalescer {
    pending: Vec<(String, ChangeKind)>,
}

impl Coalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Record one event, collapsing into an already-pending entry when the
    /// path was seen earlier in this window.
    pub fn observe(&mut self, path: String, kind: ChangeKind) {
        match self.pending.iter_mut().find(|(p, _)| *p == path) {
            Some((_, pending)) => *pending = merge_kinds(*pending, kind),
            None => self.pending.push((path, kind)),
        }
    }

    /// Take the collapsed batch, emptying the window.
    pub fn drain(&mut self) -> Vec<(ChangeKind, String)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(path, kind)| (kind, path))
            .collect()
    }
}
