// src/build/scheduler.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::build::plan::{Plan, plan_changes};
use crate::build::session::WatchSession;
use crate::build::task::{BuildReport, BuildTask, TaskRecord, TaskStatus};
use crate::classify::Classifier;
use crate::errors::Result;
use crate::fs::{FileSystem, walk_files};
use crate::output::{OutputStore, fingerprint_bytes};
use crate::pipeline::Registry;
use crate::types::{ChangeKind, TaskReason};

/// What caused a batch.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Enumerate the whole source tree (startup, or an explicit rebuild).
    FullRebuild,
    /// Coalesced watcher notifications, paths relative to the source root.
    Changes(Vec<(ChangeKind, String)>),
}

/// Decides what to rebuild, runs the pipelines, writes artifacts.
///
/// Owns the classifier, the pipeline registry and the session watermark;
/// reads sources through [`FileSystem`] and writes through [`OutputStore`],
/// so every behaviour is testable without a real disk.
#[derive(Debug)]
pub struct Scheduler {
    classifier: Classifier,
    registry: Registry,
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn OutputStore>,
    source_root: PathBuf,
    session: WatchSession,
}

impl Scheduler {
    pub fn new(
        classifier: Classifier,
        registry: Registry,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn OutputStore>,
        source_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            classifier,
            registry,
            fs,
            store,
            source_root: source_root.into(),
            session: WatchSession::new(),
        }
    }

    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    /// Run one batch.
    ///
    /// Returns `Err` only when a full rebuild cannot enumerate the source
    /// tree at all; task-level failures are recorded in the report and never
    /// escalate.
    pub fn schedule(&mut self, trigger: Trigger) -> Result<BuildReport> {
        let batch_started = SystemTime::now();

        let plan = match trigger {
            Trigger::FullRebuild => self.plan_full_rebuild()?,
            Trigger::Changes(changes) => plan_changes(&self.classifier, &changes),
        };

        if plan.tasks.is_empty() {
            debug!("batch planned no tasks");
            return Ok(BuildReport::default());
        }

        let mut records = Vec::with_capacity(plan.tasks.len());
        for task in plan.tasks {
            records.push(self.execute(task));
        }

        let report = BuildReport { records };

        // Watermark only after the whole batch ran, and only for categories
        // without failures; a crash before this point, or a failed task,
        // re-considers the affected paths on the next full scan.
        let failed: Vec<_> = report.failures().map(|r| r.task.category).collect();
        let touched: Vec<_> = report
            .records
            .iter()
            .map(|r| r.task.category)
            .filter(|c| !failed.contains(c))
            .collect();
        self.session.record_batch(touched, batch_started);

        let (written, skipped, deleted, failed) = report.counts();
        info!(written, skipped, deleted, failed, "batch complete");

        Ok(report)
    }

    /// Enumerate every source file, bounded per category by the session
    /// watermark.
    fn plan_full_rebuild(&self) -> Result<Plan> {
        let files = walk_files(self.fs.as_ref(), &self.source_root)
            .with_context(|| format!("enumerating source tree {:?}", self.source_root))?;

        let mut tasks = Vec::new();
        let mut unclassified = Vec::new();

        for (rel, abs) in files {
            let Some(category) = self.classifier.classify(&rel) else {
                debug!(path = %rel, "path matches no category; dropping");
                unclassified.push(rel);
                continue;
            };

            if let Some(watermark) = self.session.last_run(category) {
                match self.fs.mtime(&abs) {
                    Ok(mtime) if mtime <= watermark => {
                        debug!(path = %rel, "unchanged since last run; skipping");
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(path = %rel, error = %e, "mtime unavailable; rebuilding anyway");
                    }
                }
            }

            tasks.push(BuildTask {
                category,
                source_path: rel,
                reason: TaskReason::Initial,
            });
        }

        Ok(Plan {
            tasks,
            unclassified,
        })
    }

    /// Run one task to a terminal status. Never panics, never escalates:
    /// sibling tasks in the batch are isolated from this task's failure.
    fn execute(&self, task: BuildTask) -> TaskRecord {
        let status = match task.reason {
            TaskReason::Removed => self.delete_outputs(&task),
            _ => self.build(&task),
        };

        match &status {
            TaskStatus::Written(paths) => {
                info!(category = %task.category, path = %task.source_path, outputs = ?paths, "built");
            }
            TaskStatus::Skipped => {
                debug!(category = %task.category, path = %task.source_path, "unchanged; skipped");
            }
            TaskStatus::Deleted(paths) => {
                info!(category = %task.category, path = %task.source_path, outputs = ?paths, "removed outputs");
            }
            TaskStatus::Failed(cause) => {
                warn!(category = %task.category, path = %task.source_path, cause = %cause, "task failed");
            }
        }

        TaskRecord { task, status }
    }

    /// Mirror a source deletion into the output tree.
    fn delete_outputs(&self, task: &BuildTask) -> TaskStatus {
        let pipeline = match self.registry.pipeline(task.category) {
            Ok(p) => p,
            Err(e) => return TaskStatus::Failed(format!("{e:#}")),
        };

        let paths = pipeline.output_paths(&task.source_path);
        for path in &paths {
            if let Err(e) = self.store.delete(path) {
                return TaskStatus::Failed(format!("{e:#}"));
            }
        }
        TaskStatus::Deleted(paths)
    }

    /// Render the task's pipeline and write artifacts that actually differ.
    fn build(&self, task: &BuildTask) -> TaskStatus {
        let pipeline = match self.registry.pipeline(task.category) {
            Ok(p) => p,
            Err(e) => return TaskStatus::Failed(format!("{e:#}")),
        };

        let abs = self.source_root.join(&task.source_path);
        let bytes = match self.fs.read(&abs) {
            Ok(b) => b,
            Err(e) => return TaskStatus::Failed(format!("{e:#}")),
        };

        let artifacts = match pipeline.render(&task.source_path, bytes) {
            Ok(a) => a,
            Err(e) => return TaskStatus::Failed(format!("{e:#}")),
        };

        let mut written = Vec::new();
        for artifact in artifacts {
            let fresh = fingerprint_bytes(&artifact.bytes);
            match self.store.fingerprint(&artifact.rel_path) {
                Ok(Some(existing)) if existing == fresh => {
                    debug!(path = %artifact.rel_path, "artifact content unchanged");
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    // Unknown previous content: write rather than skip.
                    warn!(path = %artifact.rel_path, error = %e, "fingerprint unavailable");
                }
            }

            if let Err(e) = self.store.write(&artifact.rel_path, &artifact.bytes) {
                return TaskStatus::Failed(format!("{e:#}"));
            }
            written.push(artifact.rel_path);
        }

        if written.is_empty() {
            TaskStatus::Skipped
        } else {
            TaskStatus::Written(written)
        }
    }
}
