// tests/full_build.rs

mod common;
use crate::common::init_tracing;

use assetwatch::build::TaskStatus;
use assetwatch::types::{AssetCategory, TaskReason};
use assetwatch_test_utils::{BuildHarness, ConfigFileBuilder};

/// Fresh tree with `index.html`, `main.scss`, `app.js`: the full build
/// writes the minified page, the compiled stylesheet plus its map, and the
/// script verbatim.
#[test]
fn fresh_tree_full_build_writes_all_artifacts() {
    init_tracing();

    let cfg = ConfigFileBuilder::new().build();
    let mut harness = BuildHarness::new(&cfg);
    harness.add_source("index.html", "<h1>hello</h1>\n");
    harness.add_source(
        "sass/main.scss",
        "$accent: #f80;\nbody {\n  color: $accent;\n}\n",
    );
    harness.add_source("js/app.js", "console.log('app');\n");

    let report = harness.full_rebuild().unwrap();

    assert_eq!(report.records.len(), 3);
    assert!(
        report
            .records
            .iter()
            .all(|r| r.task.reason == TaskReason::Initial)
    );
    assert!(report.failures().next().is_none());

    assert_eq!(
        harness.store.paths(),
        vec![
            "index.html".to_string(),
            "js/app.js".to_string(),
            "main.css".to_string(),
            "main.css.map".to_string(),
        ]
    );

    // Markup keeps whitespace by default; scripts are copied verbatim.
    assert_eq!(
        harness.store.contents("index.html").unwrap(),
        b"<h1>hello</h1>\n".to_vec()
    );
    assert_eq!(
        harness.store.contents("js/app.js").unwrap(),
        b"console.log('app');\n".to_vec()
    );

    // The stylesheet is desugared, minified and carries a map reference.
    let css = String::from_utf8(harness.store.contents("main.css").unwrap()).unwrap();
    assert!(css.starts_with("body{color:#f80}"));
    assert!(css.contains("/*# sourceMappingURL=main.css.map */"));

    let map: serde_json::Value =
        serde_json::from_slice(&harness.store.contents("main.css.map").unwrap()).unwrap();
    assert_eq!(map["sources"][0], "sass/main.scss");
}

#[test]
fn collapsing_whitespace_minifies_markup() {
    init_tracing();

    let cfg = ConfigFileBuilder::new().preserve_whitespace(false).build();
    let mut harness = BuildHarness::new(&cfg);
    harness.add_source("index.html", "<p>\n   hello   world\n</p>\n");

    harness.full_rebuild().unwrap();

    assert_eq!(
        harness.store.contents("index.html").unwrap(),
        b"<p> hello world </p>".to_vec()
    );
}

#[test]
fn unclassified_files_are_dropped_not_fatal() {
    init_tracing();

    let cfg = ConfigFileBuilder::new().build();
    let mut harness = BuildHarness::new(&cfg);
    harness.add_source("README.md", "# readme\n");
    harness.add_source("index.html", "<p>x</p>\n");

    let report = harness.full_rebuild().unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].task.category, AssetCategory::Markup);
}

/// The session watermark bounds a repeated full rebuild to files modified
/// since the last completed batch.
#[test]
fn second_full_rebuild_skips_untouched_files() {
    init_tracing();

    let cfg = ConfigFileBuilder::new().build();
    let mut harness = BuildHarness::new(&cfg);
    harness.add_source("index.html", "<p>x</p>\n");
    harness.add_source("js/app.js", "1;\n");

    let first = harness.full_rebuild().unwrap();
    assert_eq!(first.records.len(), 2);

    // Nothing changed: mock mtimes stay behind the watermark.
    let second = harness.full_rebuild().unwrap();
    assert!(second.records.is_empty());

    // A file touched after the first batch is picked up again.
    harness
        .fs
        .add_file_at("js/app.js", "2;\n", std::time::SystemTime::now());
    let third = harness.full_rebuild().unwrap();
    assert_eq!(third.records.len(), 1);
    assert_eq!(third.records[0].task.source_path, "js/app.js");
    assert!(matches!(third.records[0].status, TaskStatus::Written(_)));
}

/// A missing source root is the one fatal case.
#[test]
fn inaccessible_source_tree_is_a_batch_error() {
    init_tracing();

    let cfg = ConfigFileBuilder::new().source_root("missing").build();
    let fs = assetwatch::fs::mock::MockFileSystem::new();
    let store = assetwatch_test_utils::MemoryStore::new();
    let mut scheduler = assetwatch::build::Scheduler::new(
        assetwatch::classify::Classifier::from_config(&cfg).unwrap(),
        assetwatch::pipeline::Registry::from_config(&cfg).unwrap(),
        std::sync::Arc::new(fs),
        std::sync::Arc::new(store),
        "missing",
    );

    assert!(
        scheduler
            .schedule(assetwatch::build::Trigger::FullRebuild)
            .is_err()
    );
}
