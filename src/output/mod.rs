// src/output/mod.rs

//! The destination tree.
//!
//! [`OutputStore`] is the narrow interface the scheduler writes through:
//! existence/fingerprint queries back the skip-if-unchanged policy, `write`
//! must be atomic per path (no half-written artifact may ever be observable),
//! `delete` mirrors source deletions, `clean` empties the whole tree for the
//! CLI `clean` command.

use std::fmt::Debug;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Abstract artifact store keyed by output-root-relative paths
/// (forward slashes).
pub trait OutputStore: Send + Sync + Debug {
    fn exists(&self, rel: &str) -> bool;

    /// Content fingerprint of an existing artifact, `None` when absent.
    fn fingerprint(&self, rel: &str) -> Result<Option<String>>;

    /// Atomically replace the artifact at `rel` with `bytes`.
    fn write(&self, rel: &str, bytes: &[u8]) -> Result<()>;

    /// Remove the artifact at `rel`; removing an absent artifact is a no-op.
    fn delete(&self, rel: &str) -> Result<()>;

    /// Empty the store.
    fn clean(&self) -> Result<()>;
}

/// Fingerprint arbitrary bytes the same way the store fingerprints
/// artifacts, so rendered output can be compared without writing it.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Store writing into a directory tree on disk.
///
/// Writes go to a temp file in the target directory first and are renamed
/// into place, so a failed write never leaves a partial artifact.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

impl OutputStore for DiskStore {
    fn exists(&self, rel: &str) -> bool {
        self.abs(rel).is_file()
    }

    fn fingerprint(&self, rel: &str) -> Result<Option<String>> {
        let path = self.abs(rel);
        if !path.is_file() {
            return Ok(None);
        }

        let mut hasher = Hasher::new();
        let mut file =
            File::open(&path).with_context(|| format!("opening artifact {:?}", path))?;
        let mut buf = [0u8; 8192];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Some(hasher.finalize().to_hex().to_string()))
    }

    fn write(&self, rel: &str, bytes: &[u8]) -> Result<()> {
        let path = self.abs(rel);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;

        let tmp = tempfile::NamedTempFile::new_in(&parent)
            .with_context(|| format!("creating temp file in {:?}", parent))?;
        fs::write(tmp.path(), bytes)
            .with_context(|| format!("writing temp artifact for {rel}"))?;
        tmp.persist(&path)
            .with_context(|| format!("replacing artifact {:?}", path))?;

        debug!(path = %rel, bytes = bytes.len(), "wrote artifact");
        Ok(())
    }

    fn delete(&self, rel: &str) -> Result<()> {
        let path = self.abs(rel);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %rel, "deleted artifact");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("deleting artifact {:?}", path)),
        }
    }

    fn clean(&self) -> Result<()> {
        if !self.root.exists() {
            return Ok(());
        }
        for entry in
            fs::read_dir(&self.root).with_context(|| format!("reading {:?}", self.root))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("removing {:?}", path))?;
            } else {
                fs::remove_file(&path)
                    .with_context(|| format!("removing {:?}", path))?;
            }
        }
        debug!(root = ?self.root, "cleaned output root");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_fingerprint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store.write("js/app.js", b"console.log(1);").unwrap();
        assert!(store.exists("js/app.js"));

        let fp = store.fingerprint("js/app.js").unwrap().unwrap();
        assert_eq!(fp, fingerprint_bytes(b"console.log(1);"));
        assert!(store.fingerprint("missing.txt").unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store.write("index.html", b"<p>x</p>").unwrap();
        store.delete("index.html").unwrap();
        assert!(!store.exists("index.html"));
        store.delete("index.html").unwrap();
    }

    #[test]
    fn clean_empties_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());

        store.write("a.txt", b"a").unwrap();
        store.write("nested/b.txt", b"b").unwrap();
        store.clean().unwrap();

        assert!(!store.exists("a.txt"));
        assert!(!store.exists("nested/b.txt"));
        assert!(dir.path().exists());
    }
}
