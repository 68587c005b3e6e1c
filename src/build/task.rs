// src/build/task.rs

//! Build tasks and per-batch reports.

use crate::types::{AssetCategory, TaskReason};

/// One unit of work: rebuild (or delete the outputs of) one source path.
///
/// Created by the planner, consumed once by the scheduler, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub category: AssetCategory,
    /// Path relative to the source root, forward slashes.
    pub source_path: String,
    pub reason: TaskReason,
}

/// Terminal state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// At least one artifact was written; paths are output-root-relative.
    Written(Vec<String>),
    /// Every rendered artifact was content-identical to the store; nothing
    /// was written and no notification should follow.
    Skipped,
    /// The task mirrored a source deletion into the output tree.
    Deleted(Vec<String>),
    /// The task failed in isolation; previous outputs are untouched.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task: BuildTask,
    pub status: TaskStatus,
}

/// Everything that happened in one batch, in execution order.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub records: Vec<TaskRecord>,
}

impl BuildReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Artifact paths actually written, with their category.
    pub fn written_artifacts(&self) -> Vec<(AssetCategory, &str)> {
        self.records
            .iter()
            .filter_map(|r| match &r.status {
                TaskStatus::Written(paths) => Some((r.task.category, paths)),
                _ => None,
            })
            .flat_map(|(cat, paths)| paths.iter().map(move |p| (cat, p.as_str())))
            .collect()
    }

    /// Artifact paths removed by deletion mirroring, with their category.
    pub fn deleted_artifacts(&self) -> Vec<(AssetCategory, &str)> {
        self.records
            .iter()
            .filter_map(|r| match &r.status {
                TaskStatus::Deleted(paths) => Some((r.task.category, paths)),
                _ => None,
            })
            .flat_map(|(cat, paths)| paths.iter().map(move |p| (cat, p.as_str())))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Failed(_)))
    }

    /// True when the batch had tasks and every single one failed. Used to
    /// decide whether the initial full build "failed entirely".
    pub fn all_failed(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| matches!(r.status, TaskStatus::Failed(_)))
    }

    /// (written, skipped, deleted, failed) task counts for log lines.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for record in &self.records {
            match record.status {
                TaskStatus::Written(_) => counts.0 += 1,
                TaskStatus::Skipped => counts.1 += 1,
                TaskStatus::Deleted(_) => counts.2 += 1,
                TaskStatus::Failed(_) => counts.3 += 1,
            }
        }
        counts
    }
}
