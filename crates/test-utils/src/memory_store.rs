use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use assetwatch::output::{OutputStore, fingerprint_bytes};

/// Recording in-memory `OutputStore`.
///
/// Counts every `write`/`delete` call so tests can assert the
/// skip-if-unchanged property ("write count for that path is zero") without
/// a real disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    artifacts: BTreeMap<String, Vec<u8>>,
    write_count: usize,
    delete_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, rel: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().artifacts.get(rel).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().unwrap().artifacts.keys().cloned().collect()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().write_count
    }

    pub fn delete_count(&self) -> usize {
        self.inner.lock().unwrap().delete_count
    }
}

impl OutputStore for MemoryStore {
    fn exists(&self, rel: &str) -> bool {
        self.inner.lock().unwrap().artifacts.contains_key(rel)
    }

    fn fingerprint(&self, rel: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.artifacts.get(rel).map(|b| fingerprint_bytes(b)))
    }

    fn write(&self, rel: &str, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_count += 1;
        inner.artifacts.insert(rel.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, rel: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_count += 1;
        inner.artifacts.remove(rel);
        Ok(())
    }

    fn clean(&self) -> Result<()> {
        self.inner.lock().unwrap().artifacts.clear();
        Ok(())
    }
}
