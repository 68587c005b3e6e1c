// src/build/plan.rs

//! Pure planning: watcher notifications -> deduplicated build tasks.
//!
//! No filesystem, no channels; extensively unit tested. The scheduler's IO
//! half consumes the resulting [`Plan`].

use tracing::debug;

use crate::build::task::BuildTask;
use crate::classify::Classifier;
use crate::types::{ChangeKind, TaskReason};

/// Outcome of planning one incremental trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Deduplicated tasks, deletions first.
    pub tasks: Vec<BuildTask>,
    /// Paths that matched no category; dropped with a diagnostic.
    pub unclassified: Vec<String>,
}

/// Collapse a later event kind into an existing reason for the same path.
///
/// - `Removed` then `Add`/`Change` is a net `Changed` (the file still exists
///   with possibly different content).
/// - anything then `Unlink` is `Removed`.
/// - `Added` then `Change` escalates to `Changed`.
pub fn merge_reason(prev: TaskReason, kind: ChangeKind) -> TaskReason {
    match (prev, kind) {
        (TaskReason::Removed, ChangeKind::Add | ChangeKind::Change) => TaskReason::Changed,
        (_, ChangeKind::Unlink) => TaskReason::Removed,
        (TaskReason::Added, ChangeKind::Add) => TaskReason::Added,
        (_, ChangeKind::Add | ChangeKind::Change) => TaskReason::Changed,
    }
}

/// Classify and deduplicate a batch of `(kind, path)` notifications.
///
/// Events are folded per path in arrival order with [`merge_reason`]; the
/// returned task order puts deletions before builds, preserving first-seen
/// order within each group.
pub fn plan_changes(classifier: &Classifier, changes: &[(ChangeKind, String)]) -> Plan {
    let mut unclassified = Vec::new();
    // Vec keeps first-seen order; batches are small, linear lookup is fine.
    let mut folded: Vec<BuildTask> = Vec::new();

    for (kind, path) in changes {
        let Some(category) = classifier.classify(path) else {
            debug!(path = %path, "path matches no category; dropping");
            if !unclassified.contains(path) {
                unclassified.push(path.clone());
            }
            continue;
        };

        match folded.iter_mut().find(|t| t.source_path == *path) {
            Some(task) => task.reason = merge_reason(task.reason, *kind),
            None => folded.push(BuildTask {
                category,
                source_path: path.clone(),
                reason: TaskReason::from_change(*kind),
            }),
        }
    }

    let (removals, builds): (Vec<_>, Vec<_>) = folded
        .into_iter()
        .partition(|t| t.reason == TaskReason::Removed);

    let mut tasks = removals;
    tasks.extend(builds);

    Plan {
        tasks,
        unclassified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::types::AssetCategory;

    fn classifier() -> Classifier {
        let raw: RawConfigFile = toml::from_str("").unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();
        Classifier::from_config(&cfg).unwrap()
    }

    fn change(kind: ChangeKind, path: &str) -> (ChangeKind, String) {
        (kind, path.to_string())
    }

    #[test]
    fn added_then_changed_collapses_to_one_changed_task() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Add, "sass/main.scss"),
                change(ChangeKind::Change, "sass/main.scss"),
            ],
        );

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].reason, TaskReason::Changed);
        assert_eq!(plan.tasks[0].category, AssetCategory::Style);
    }

    #[test]
    fn removed_then_added_is_a_net_change() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Unlink, "js/app.js"),
                change(ChangeKind::Add, "js/app.js"),
            ],
        );

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].reason, TaskReason::Changed);
    }

    #[test]
    fn change_then_unlink_is_removed() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Change, "index.html"),
                change(ChangeKind::Unlink, "index.html"),
            ],
        );

        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].reason, TaskReason::Removed);
    }

    #[test]
    fn unclassified_paths_are_dropped_not_fatal() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Change, "notes.md"),
                change(ChangeKind::Change, "index.html"),
            ],
        );

        assert_eq!(plan.unclassified, vec!["notes.md".to_string()]);
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].category, AssetCategory::Markup);
    }

    #[test]
    fn deletions_are_ordered_before_builds() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Change, "index.html"),
                change(ChangeKind::Unlink, "js/old.js"),
                change(ChangeKind::Add, "js/new.js"),
            ],
        );

        assert_eq!(plan.tasks[0].reason, TaskReason::Removed);
        assert_eq!(plan.tasks[0].source_path, "js/old.js");
        assert_eq!(plan.tasks.len(), 3);
    }

    #[test]
    fn distinct_paths_never_share_a_task() {
        let plan = plan_changes(
            &classifier(),
            &[
                change(ChangeKind::Change, "sass/a.scss"),
                change(ChangeKind::Change, "sass/b.scss"),
            ],
        );
        assert_eq!(plan.tasks.len(), 2);
    }
}
