// tests/incremental.rs

mod common;
use crate::common::init_tracing;

use assetwatch::build::TaskStatus;
use assetwatch::output::OutputStore;
use assetwatch::types::{AssetCategory, ChangeKind, TaskReason};
use assetwatch_test_utils::{BuildHarness, ConfigFileBuilder};

fn built_harness() -> BuildHarness {
    let cfg = ConfigFileBuilder::new().build();
    let mut harness = BuildHarness::new(&cfg);
    harness.add_source("index.html", "<h1>hello</h1>\n");
    harness.add_source("sass/main.scss", "$c: red;\nbody { color: $c; }\n");
    harness.add_source("js/app.js", "console.log(1);\n");
    harness.add_source("assets/images/logo.png", vec![137, 80, 78, 71]);
    harness.full_rebuild().unwrap();
    harness
}

/// Editing `main.scss` produces exactly one Style task with reason Changed,
/// and the recompiled artifact differs from the previous fingerprint.
#[test]
fn editing_a_stylesheet_rebuilds_only_that_pipeline() {
    init_tracing();

    let mut harness = built_harness();
    let writes_before = harness.store.write_count();

    harness.add_source("sass/main.scss", "$c: blue;\nbody { color: $c; }\n");
    let report = harness
        .change(ChangeKind::Change, "sass/main.scss")
        .unwrap();

    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.task.category, AssetCategory::Style);
    assert_eq!(record.task.reason, TaskReason::Changed);
    assert!(matches!(record.status, TaskStatus::Written(_)));

    let css = String::from_utf8(harness.store.contents("main.css").unwrap()).unwrap();
    assert!(css.starts_with("body{color:blue}"));
    // Only the stylesheet was rewritten: the map sibling is content-identical
    // (its mapping payload depends on the path, not the content) and the
    // write gate skips it.
    assert_eq!(
        report.records[0].status,
        TaskStatus::Written(vec!["main.css".to_string()])
    );
    assert_eq!(harness.store.write_count(), writes_before + 1);
}

/// Touching an image with identical bytes creates a task, but the
/// content-equality check finds no difference: zero writes.
#[test]
fn identical_image_touch_writes_nothing() {
    init_tracing();

    let mut harness = built_harness();
    let writes_before = harness.store.write_count();

    harness
        .fs
        .touch("assets/images/logo.png", std::time::SystemTime::now());
    let report = harness
        .change(ChangeKind::Change, "assets/images/logo.png")
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].status, TaskStatus::Skipped);
    assert_eq!(harness.store.write_count(), writes_before);
}

/// Deleting a source removes exactly its output artifacts, no orphans.
#[test]
fn deleting_a_script_mirrors_into_the_output_tree() {
    init_tracing();

    let mut harness = built_harness();
    assert!(harness.store.exists("js/app.js"));

    harness.remove_source("js/app.js");
    let report = harness.change(ChangeKind::Unlink, "js/app.js").unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(
        report.records[0].status,
        TaskStatus::Deleted(vec!["js/app.js".to_string()])
    );
    assert!(!harness.store.exists("js/app.js"));
    // The rest of the output tree is untouched.
    assert!(harness.store.exists("index.html"));
    assert!(harness.store.exists("main.css"));
}

/// Style deletion also removes the source-map sibling.
#[test]
fn deleting_a_stylesheet_removes_the_map_sibling() {
    init_tracing();

    let mut harness = built_harness();
    assert!(harness.store.exists("main.css.map"));

    harness.remove_source("sass/main.scss");
    let report = harness
        .change(ChangeKind::Unlink, "sass/main.scss")
        .unwrap();

    assert_eq!(
        report.records[0].status,
        TaskStatus::Deleted(vec!["main.css".to_string(), "main.css.map".to_string()])
    );
    assert!(!harness.store.exists("main.css"));
    assert!(!harness.store.exists("main.css.map"));
}

/// An add immediately followed by a change within one batch collapses to a
/// single task with reason Changed.
#[test]
fn add_then_change_collapses_in_one_batch() {
    init_tracing();

    let mut harness = built_harness();
    harness.add_source("js/new.js", "export {};\n");

    let report = harness
        .changes(&[
            (ChangeKind::Add, "js/new.js"),
            (ChangeKind::Change, "js/new.js"),
        ])
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].task.reason, TaskReason::Changed);
    assert!(harness.store.exists("js/new.js"));
}

/// A removal followed by re-creation in the same batch is a net change: the
/// artifact is rebuilt, not deleted.
#[test]
fn remove_then_add_is_a_net_change() {
    init_tracing();

    let mut harness = built_harness();
    harness.add_source("js/app.js", "console.log(2);\n");

    let report = harness
        .changes(&[
            (ChangeKind::Unlink, "js/app.js"),
            (ChangeKind::Add, "js/app.js"),
        ])
        .unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].task.reason, TaskReason::Changed);
    assert!(matches!(report.records[0].status, TaskStatus::Written(_)));
    assert_eq!(
        harness.store.contents("js/app.js").unwrap(),
        b"console.log(2);\n".to_vec()
    );
}

/// Unchanged markup re-saved by an editor: rendered output matches the
/// existing artifact, so the task reports success without writing.
#[test]
fn resaving_identical_markup_is_skipped() {
    init_tracing();

    let mut harness = built_harness();
    let writes_before = harness.store.write_count();

    let report = harness.change(ChangeKind::Change, "index.html").unwrap();

    assert_eq!(report.records[0].status, TaskStatus::Skipped);
    assert_eq!(harness.store.write_count(), writes_before);
}
