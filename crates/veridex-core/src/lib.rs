//! Index matching and provenance engine.
//!
//! Veridex establishes that a locally held package artifact is attested by a
//! trusted, signed remote package index: the artifact's name, version, and
//! content hash must jointly appear in one coherent index record, and only
//! indexes whose authenticity has been independently verified are consulted.
//!
//! This crate is the engine. It is network-free: index retrieval, manifest
//! retrieval, and signature verification enter through the traits in
//! [`providers`]. The pipeline is:
//!
//! 1. [`gate::verify_suites`] — decide which suites are trustworthy this run.
//! 2. [`scan::Scanner`] — iterate artifacts over gated sources in fixed
//!    priority order, first full match wins per artifact.
//! 3. [`classify::classify`] — when no source matched, explain why with one
//!    of five mutually exclusive reason codes.
//! 4. [`retry::offer_retry`] — optionally re-scan unmatched artifacts against
//!    the suites that failed the gate, on explicit operator acceptance.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use veridex_core::{gate, retry, scan};
//!
//! # async fn example(
//! #     artifacts: Vec<veridex_core::Artifact>,
//! #     sources: Vec<veridex_core::IndexSource>,
//! #     provider: Arc<dyn veridex_core::IndexProvider>,
//! #     manifests: &dyn veridex_core::ManifestProvider,
//! #     verifier: &dyn veridex_core::SignatureVerifier,
//! # ) -> anyhow::Result<()> {
//! let gate = gate::verify_suites(&sources, manifests, verifier).await;
//! let scanner = scan::Scanner::new(provider, sources, gate);
//! let outcome = scanner.run(artifacts).await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod model;
pub mod providers;
pub mod report;
pub mod retry;
pub mod scan;
pub mod stanza;

pub use classify::{classify, ScanEvidence};
pub use error::{CoreError, CoreResult};
pub use gate::verify_suites;
pub use matcher::{match_stanzas, MatchTarget, SourceScan};
pub use model::{
    Artifact, GateState, IndexSource, MatchResult, PartialEvidence, ReasonCode, ResultRecord,
    Stanza,
};
pub use providers::{
    FetchedIndex, IndexProvider, ManifestProvider, RetryDecider, SignatureVerifier,
    SourceUnavailable, SuiteManifest,
};
pub use report::{csv_row, record_for, write_sorted, ResultLog, CSV_HEADER};
pub use retry::offer_retry;
pub use scan::{ArtifactScan, RunOutcome, Scanner};
pub use stanza::parse;
