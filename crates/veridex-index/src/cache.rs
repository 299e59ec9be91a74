//! On-disk cache of downloaded index blobs, keyed by (suite, component).
//!
//! Concurrent readers are safe. Writers to the same key are serialized by
//! the filesystem: blobs land under a unique temporary name first, then a
//! single rename publishes them, and the first writer wins — a key that
//! already exists is never overwritten within or across runs.

use std::path::{Path, PathBuf};

use veridex_core::IndexSource;

use crate::error::{IndexError, IndexResult};

/// Blob cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, source: &IndexSource) -> PathBuf {
        self.dir.join(format!("{}.blob", source.file_stem()))
    }

    /// Read the cached raw blob for a source, if present.
    pub async fn get(&self, source: &IndexSource) -> Option<Vec<u8>> {
        let path = self.blob_path(source);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(source = %source.label(), "index cache hit");
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    /// Store a raw blob. First writer wins; a concurrent or earlier write
    /// for the same key is kept and this blob is discarded.
    pub async fn put(&self, source: &IndexSource, blob: &[u8]) -> IndexResult<()> {
        let path = self.blob_path(source);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| cache_err(&self.dir, &e))?;

        // Unique temp name per writer, then an atomic publish.
        let tmp = self.dir.join(format!(
            ".tmp-{}-{}",
            source.file_stem(),
            std::process::id()
        ));
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| cache_err(&tmp, &e))?;

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            // Lost the race; keep the first writer's blob.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Ok(());
        }
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| cache_err(&path, &e))?;

        tracing::debug!(source = %source.label(), path = %path.display(), "index blob cached");
        Ok(())
    }
}

fn cache_err(path: &Path, e: &std::io::Error) -> IndexError {
    IndexError::Cache {
        message: format!("{}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(suite: &str, component: &str) -> IndexSource {
        IndexSource {
            suite: suite.to_string(),
            component: component.to_string(),
            origin_url: String::new(),
        }
    }

    #[tokio::test]
    async fn round_trips_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());
        let src = source("stable", "main");

        assert!(cache.get(&src).await.is_none());
        cache.put(&src, b"blob bytes").await.unwrap();
        assert_eq!(cache.get(&src).await.unwrap(), b"blob bytes");
    }

    #[tokio::test]
    async fn first_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());
        let src = source("stable", "main");

        cache.put(&src, b"first").await.unwrap();
        cache.put(&src, b"second").await.unwrap();
        assert_eq!(cache.get(&src).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn keys_do_not_collide_across_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());

        cache.put(&source("stable", "main"), b"a").await.unwrap();
        cache.put(&source("stable", "extra"), b"b").await.unwrap();
        assert_eq!(cache.get(&source("stable", "main")).await.unwrap(), b"a");
        assert_eq!(cache.get(&source("stable", "extra")).await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn cache_dir_is_created_on_first_put() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("nested").join("cache"));
        cache.put(&source("stable", "main"), b"a").await.unwrap();
        assert!(cache.get(&source("stable", "main")).await.is_some());
    }
}
