use std::sync::Arc;

use assetwatch::build::{BuildReport, Scheduler, Trigger};
use assetwatch::classify::Classifier;
use assetwatch::config::ConfigFile;
use assetwatch::errors::Result;
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::pipeline::Registry;
use assetwatch::types::ChangeKind;

use crate::memory_store::MemoryStore;

/// Scheduler wired to a mock filesystem and a recording store.
///
/// The source root is `"."` inside the mock, so sources are added with their
/// source-relative path (`harness.add_source("sass/main.scss", ...)`).
pub struct BuildHarness {
    pub fs: MockFileSystem,
    pub store: MemoryStore,
    pub scheduler: Scheduler,
}

impl BuildHarness {
    pub fn new(cfg: &ConfigFile) -> Self {
        let fs = MockFileSystem::new();
        let store = MemoryStore::new();

        let classifier = Classifier::from_config(cfg).expect("classifier from config");
        let registry = Registry::from_config(cfg).expect("registry from config");
        let scheduler = Scheduler::new(
            classifier,
            registry,
            Arc::new(fs.clone()),
            Arc::new(store.clone()),
            ".",
        );

        Self {
            fs,
            store,
            scheduler,
        }
    }

    pub fn add_source(&self, rel: &str, content: impl Into<Vec<u8>>) {
        self.fs.add_file(rel, content);
    }

    pub fn remove_source(&self, rel: &str) {
        self.fs.remove_file(rel);
    }

    pub fn full_rebuild(&mut self) -> Result<BuildReport> {
        self.scheduler.schedule(Trigger::FullRebuild)
    }

    pub fn change(&mut self, kind: ChangeKind, rel: &str) -> Result<BuildReport> {
        self.changes(&[(kind, rel)])
    }

    pub fn changes(&mut self, changes: &[(ChangeKind, &str)]) -> Result<BuildReport> {
        let changes = changes
            .iter()
            .map(|(kind, rel)| (*kind, rel.to_string()))
            .collect();
        self.scheduler.schedule(Trigger::Changes(changes))
    }
}
