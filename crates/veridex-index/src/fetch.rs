//! HTTP-backed implementation of the engine's acquisition traits.
//!
//! Composition per source: cache lookup, HTTP retrieval (compressed first,
//! plain fallback), gzip decode, digest cross-check against the suite's
//! signed manifest when one is held, then cache publish. Every failure maps
//! to `SourceUnavailable` at the trait boundary; nothing here is fatal to
//! the run.

use std::collections::HashMap;
use std::io::Read;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use veridex_core::{
    FetchedIndex, IndexProvider, IndexSource, ManifestProvider, SourceUnavailable, SuiteManifest,
};

use crate::cache::IndexCache;
use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::http::HttpBackend;
use crate::manifest::{parse_manifest, SuiteManifestFile};

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Index and manifest acquisition over HTTP with an on-disk blob cache.
pub struct HttpIndexProvider {
    config: IndexConfig,
    backend: HttpBackend,
    cache: IndexCache,
    /// Parsed manifests by suite, retained for index digest cross-checks.
    manifests: RwLock<HashMap<String, SuiteManifestFile>>,
}

impl HttpIndexProvider {
    pub fn new(config: IndexConfig) -> IndexResult<Self> {
        let backend = HttpBackend::new(&config)?;
        let cache = IndexCache::new(config.cache_dir.clone());
        Ok(Self {
            config,
            backend,
            cache,
            manifests: RwLock::new(HashMap::new()),
        })
    }

    /// URL a source's index blob is retrieved from, for populating
    /// `IndexSource::origin_url`.
    pub fn index_url(&self, suite: &str, component: &str) -> String {
        self.config.index_url(suite, component)
    }

    async fn retrieve_blob(&self, source: &IndexSource) -> IndexResult<Vec<u8>> {
        if let Some(blob) = self.cache.get(source).await {
            return Ok(blob);
        }

        let gz_url = self.config.index_url(&source.suite, &source.component);
        let blob = match self.backend.get_bytes(&gz_url).await {
            Ok(blob) => blob,
            Err(IndexError::NotFound { .. }) => {
                let plain_url = self
                    .config
                    .plain_index_url(&source.suite, &source.component);
                tracing::debug!(
                    source = %source.label(),
                    "compressed index not published, trying plain"
                );
                self.backend.get_bytes(&plain_url).await?
            }
            Err(e) => return Err(e),
        };
        Ok(blob)
    }

    /// Cross-check a retrieved blob against the suite manifest's published
    /// digest, when the manifest holds an entry for this component. A
    /// tampered index must never reach the matcher.
    async fn check_digest(&self, source: &IndexSource, blob: &[u8]) -> IndexResult<()> {
        let manifests = self.manifests.read().await;
        let Some(manifest) = manifests.get(&source.suite) else {
            return Ok(());
        };

        let candidates: Vec<_> = [
            format!("{}/Index.gz", source.component),
            format!("{}/Index", source.component),
        ]
        .into_iter()
        .filter_map(|path| manifest.digests.get(&path).cloned())
        .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let actual = hex::encode(Sha256::digest(blob));
        if candidates.iter().any(|entry| entry.sha256 == actual) {
            return Ok(());
        }

        Err(IndexError::DigestMismatch {
            source_label: source.label(),
            expected: candidates[0].sha256.clone(),
            actual,
        })
    }
}

#[async_trait]
impl IndexProvider for HttpIndexProvider {
    async fn fetch(&self, source: &IndexSource) -> Result<FetchedIndex, SourceUnavailable> {
        let raw = self
            .retrieve_blob(source)
            .await
            .map_err(|e| SourceUnavailable::new(e.to_string()))?;

        let text =
            decode_index_blob(&raw).map_err(|e| SourceUnavailable::new(e.to_string()))?;

        if let Err(e) = self.check_digest(source, &raw).await {
            tracing::warn!(source = %source.label(), error = %e, "index digest cross-check failed");
            return Err(SourceUnavailable::new(e.to_string()));
        }

        if let Err(e) = self.cache.put(source, &raw).await {
            // Cache is best-effort; the fetched blob is still good.
            tracing::warn!(source = %source.label(), error = %e, "failed to cache index blob");
        }

        Ok(FetchedIndex { text, raw })
    }
}

#[async_trait]
impl ManifestProvider for HttpIndexProvider {
    async fn fetch_manifest(&self, suite: &str) -> Result<SuiteManifest, SourceUnavailable> {
        let payload = self
            .backend
            .get_bytes(&self.config.manifest_url(suite))
            .await
            .map_err(|e| SourceUnavailable::new(e.to_string()))?;
        let signature = self
            .backend
            .get_bytes(&self.config.signature_url(suite))
            .await
            .map_err(|e| SourceUnavailable::new(e.to_string()))?;

        // Retain the parsed manifest for later index digest cross-checks.
        let text = String::from_utf8_lossy(&payload);
        self.manifests
            .write()
            .await
            .insert(suite.to_string(), parse_manifest(&text));

        Ok(SuiteManifest { payload, signature })
    }
}

/// Decode a retrieved blob to index text: gunzip when the gzip magic is
/// present, otherwise take the bytes as UTF-8.
pub fn decode_index_blob(blob: &[u8]) -> IndexResult<String> {
    if blob.starts_with(&GZIP_MAGIC) {
        let mut decoder = flate2::read::GzDecoder::new(blob);
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|e| IndexError::Decode {
                message: format!("gzip decode failed: {e}"),
            })?;
        Ok(text)
    } else {
        String::from_utf8(blob.to_vec()).map_err(|e| IndexError::Decode {
            message: format!("index is not valid UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    pub(crate) fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn decodes_gzipped_blob() {
        let text = "Name: foo\nVersion: 1.0\n";
        assert_eq!(decode_index_blob(&gzip(text)).unwrap(), text);
    }

    #[test]
    fn passes_through_plain_utf8() {
        let text = "Name: foo\n";
        assert_eq!(decode_index_blob(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn truncated_gzip_is_a_decode_error() {
        let mut blob = gzip("Name: foo\n");
        blob.truncate(blob.len() / 2);
        assert!(matches!(
            decode_index_blob(&blob),
            Err(IndexError::Decode { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        assert!(matches!(
            decode_index_blob(&[0xff, 0xfe, 0x00]),
            Err(IndexError::Decode { .. })
        ));
    }
}
