//! Suite gate: signature verification decides which suites may be trusted.
//!
//! Runs once per run, before any artifact is scanned (the gate is a barrier;
//! GateState is read-only afterwards). A suite fails if its manifest or
//! detached signature cannot be retrieved, or if verification returns false.
//! Failed suites exclude every component beneath them; they are tracked
//! separately so the classifier can report `gated_suite_skipped` rather than
//! `not_found`.

use crate::model::{GateState, IndexSource};
use crate::providers::{ManifestProvider, SignatureVerifier};

/// Verify every suite referenced by `sources` (deduplicated, in first-seen
/// order) against the trusted keyring.
pub async fn verify_suites(
    sources: &[IndexSource],
    manifests: &dyn ManifestProvider,
    verifier: &dyn SignatureVerifier,
) -> GateState {
    let mut state = GateState::default();

    for suite in dedup_suites(sources) {
        match manifests.fetch_manifest(&suite).await {
            Ok(manifest) => {
                if verifier.verify(&manifest.payload, &manifest.signature) {
                    tracing::debug!(suite = %suite, "suite manifest verified");
                    state.verified.insert(suite);
                } else {
                    tracing::warn!(suite = %suite, "suite manifest signature verification failed");
                    state.failed.insert(suite);
                }
            }
            Err(e) => {
                tracing::warn!(suite = %suite, error = %e, "suite manifest unavailable");
                state.failed.insert(suite);
            }
        }
    }

    state
}

fn dedup_suites(sources: &[IndexSource]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut suites = Vec::new();
    for source in sources {
        if seen.insert(source.suite.as_str()) {
            suites.push(source.suite.clone());
        }
    }
    suites
}
