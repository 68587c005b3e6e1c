// tests/property_laws.rs

//! Property tests for the pure planning layer: classification is a total
//! deterministic function, and event collapsing always yields at most one
//! task per path.

use proptest::prelude::*;

use assetwatch::build::{merge_reason, plan_changes};
use assetwatch::classify::Classifier;
use assetwatch::config::{ConfigFile, RawConfigFile};
use assetwatch::types::{ChangeKind, TaskReason};
use assetwatch::watch::coalesce::merge_kinds;

fn classifier() -> Classifier {
    let raw: RawConfigFile = toml::from_str("").unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();
    Classifier::from_config(&cfg).unwrap()
}

fn change_kind() -> impl Strategy<Value = ChangeKind> {
    prop_oneof![
        Just(ChangeKind::Add),
        Just(ChangeKind::Change),
        Just(ChangeKind::Unlink),
    ]
}

fn rel_path() -> impl Strategy<Value = String> {
    // Arbitrary-ish relative paths over the characters real projects use.
    "[a-z0-9_./-]{0,40}"
}

proptest! {
    /// classify(p) is total and deterministic: it never panics and repeated
    /// calls agree.
    #[test]
    fn classification_is_total_and_deterministic(path in rel_path()) {
        let c = classifier();
        let first = c.classify(&path);
        let second = c.classify(&path);
        prop_assert_eq!(first, second);
    }

    /// Any event sequence for one path collapses to at most one task.
    #[test]
    fn one_path_yields_at_most_one_task(kinds in prop::collection::vec(change_kind(), 1..8)) {
        let changes: Vec<_> = kinds
            .iter()
            .map(|k| (*k, "js/app.js".to_string()))
            .collect();

        let plan = plan_changes(&classifier(), &changes);
        prop_assert!(plan.tasks.len() <= 1);

        // The surviving reason agrees with folding the merge law directly.
        let expected = kinds[1..]
            .iter()
            .fold(TaskReason::from_change(kinds[0]), |acc, k| merge_reason(acc, *k));
        prop_assert_eq!(plan.tasks[0].reason, expected);
    }

    /// A sequence ending in Unlink always plans a removal (deleting then
    /// re-adding is the only way back to a build).
    #[test]
    fn trailing_unlink_always_removes(kinds in prop::collection::vec(change_kind(), 0..6)) {
        let mut changes: Vec<_> = kinds
            .iter()
            .map(|k| (*k, "index.html".to_string()))
            .collect();
        changes.push((ChangeKind::Unlink, "index.html".to_string()));

        let plan = plan_changes(&classifier(), &changes);
        prop_assert_eq!(plan.tasks.len(), 1);
        prop_assert_eq!(plan.tasks[0].reason, TaskReason::Removed);
    }

    /// The watcher-level collapsing rule never invents an Add after an
    /// Unlink: re-creation surfaces as Change.
    #[test]
    fn coalesced_kind_never_resurrects_add(prev in change_kind(), next in change_kind()) {
        let merged = merge_kinds(prev, next);
        if prev == ChangeKind::Unlink && next == ChangeKind::Add {
            prop_assert_eq!(merged, ChangeKind::Change);
        } else {
            prop_assert_eq!(merged, next);
        }
    }
}
