//! Collaborator traits: index acquisition, suite manifests, signature
//! verification, and the retry decision.
//!
//! The engine never performs network I/O or cryptography itself. These seams
//! keep it testable with in-memory implementations and let the acquisition
//! crate own retrieval, decompression, caching, and key handling.

use async_trait::async_trait;

use crate::model::IndexSource;

/// A source's index blob could not be retrieved or decoded. Recovered
/// locally: the source is skipped and counted as absent evidence, never
/// fatal to the run.
#[derive(Debug, Clone, thiserror::Error)]
#[error("index source unavailable: {message}")]
pub struct SourceUnavailable {
    pub message: String,
}

impl SourceUnavailable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One retrieved and decoded index blob.
#[derive(Debug, Clone)]
pub struct FetchedIndex {
    /// Decoded index text handed to the stanza parser.
    pub text: String,

    /// Raw blob bytes as retrieved (possibly compressed), preserved verbatim
    /// for the audit side artifact.
    pub raw: Vec<u8>,
}

/// Retrieves one decoded index blob per (suite, component).
#[async_trait]
pub trait IndexProvider: Send + Sync {
    async fn fetch(&self, source: &IndexSource) -> Result<FetchedIndex, SourceUnavailable>;
}

/// A suite's signed manifest and its detached signature, as retrieved.
#[derive(Debug, Clone)]
pub struct SuiteManifest {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Retrieves the signed manifest for a suite. A retrieval failure gates the
/// suite as failed.
#[async_trait]
pub trait ManifestProvider: Send + Sync {
    async fn fetch_manifest(&self, suite: &str) -> Result<SuiteManifest, SourceUnavailable>;
}

/// The external signature-verification capability. Implementations close
/// over the configured trusted keyring and fail closed: any doubt returns
/// false.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool;
}

/// Bounded operator decision for the retry controller. The default answer is
/// no; implementations must resolve within their own timeout.
#[async_trait]
pub trait RetryDecider: Send + Sync {
    async fn confirm_retry(&self, failed_suites: &[String]) -> bool;
}
