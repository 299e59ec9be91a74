//! Scan orchestrator.
//!
//! Per artifact the state machine is `Pending -> Scanning(source_i) ->
//! {Matched | Scanning(source_i+1)} -> {Matched | Exhausted}`. Sources are
//! visited in the fixed caller-supplied priority order; the first full match
//! short-circuits the remaining sources. Artifacts are independent of each
//! other, so they are scanned concurrently under a bounded semaphore while
//! per-artifact ordering and first-match semantics are preserved exactly.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::classify::{classify, ScanEvidence};
use crate::error::{CoreError, CoreResult};
use crate::matcher::{match_stanzas, MatchTarget, SourceScan};
use crate::model::{Artifact, GateState, IndexSource, MatchResult};
use crate::providers::{FetchedIndex, IndexProvider};
use crate::report::{record_for, ResultLog};
use crate::stanza::parse;

/// Default bound on concurrently scanned artifacts.
const DEFAULT_CONCURRENCY: usize = 4;

/// Deterministic file name under which a matched index's decoded text is
/// preserved next to the artifact.
pub fn audit_index_name(source: &IndexSource) -> String {
    format!("{}.index.txt", source.file_stem())
}

/// Deterministic file name for the raw matched index blob.
pub fn audit_blob_name(source: &IndexSource) -> String {
    format!("{}.index", source.file_stem())
}

/// Result of scanning one artifact. Exactly one per artifact per run.
#[derive(Debug, Clone)]
pub struct ArtifactScan {
    pub artifact: Artifact,
    pub result: MatchResult,
}

/// Output of one full run: per-artifact results in input order, plus the
/// gate state the run was executed under.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: Vec<ArtifactScan>,
    pub gate: GateState,
}

impl RunOutcome {
    /// Artifacts that did not match any source.
    pub fn unmatched(&self) -> impl Iterator<Item = &ArtifactScan> {
        self.results.iter().filter(|s| !s.result.is_matched())
    }
}

/// Iterates artifacts over gated sources and produces one [`ArtifactScan`]
/// per artifact.
#[derive(Clone)]
pub struct Scanner {
    provider: Arc<dyn IndexProvider>,
    sources: Arc<Vec<IndexSource>>,
    gate: Arc<GateState>,
    concurrency: usize,
    audit: bool,
    log: Option<Arc<ResultLog>>,
}

impl Scanner {
    pub fn new(
        provider: Arc<dyn IndexProvider>,
        sources: Vec<IndexSource>,
        gate: GateState,
    ) -> Self {
        Self {
            provider,
            sources: Arc::new(sources),
            gate: Arc::new(gate),
            concurrency: DEFAULT_CONCURRENCY,
            audit: true,
            log: None,
        }
    }

    /// Bound on concurrently scanned artifacts (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Disable writing audit copies of matched index blobs.
    pub fn without_audit(mut self) -> Self {
        self.audit = false;
        self
    }

    /// Append a result-log row as each artifact completes. Rows are whole
    /// lines under a lock, so an aborted run leaves a valid log prefix.
    pub fn with_log(mut self, log: Arc<ResultLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// The source priority order this scanner iterates.
    pub fn sources(&self) -> &[IndexSource] {
        &self.sources
    }

    /// Same provider and settings, different source set and gate. Used by
    /// the retry controller to narrow a run to previously failed suites.
    pub fn scoped(&self, sources: Vec<IndexSource>, gate: GateState) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            sources: Arc::new(sources),
            gate: Arc::new(gate),
            concurrency: self.concurrency,
            audit: self.audit,
            log: self.log.clone(),
        }
    }

    /// Scan every artifact. Results come back in input order regardless of
    /// completion order.
    pub async fn run(&self, artifacts: Vec<Artifact>) -> CoreResult<RunOutcome> {
        if artifacts.is_empty() {
            return Err(CoreError::NoArtifacts);
        }

        let total = artifacts.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join = JoinSet::new();

        for (idx, artifact) in artifacts.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let sources = Arc::clone(&self.sources);
            let gate = Arc::clone(&self.gate);
            let semaphore = Arc::clone(&semaphore);
            let audit = self.audit;

            join.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = scan_artifact(&*provider, &sources, &gate, &artifact, audit).await;
                (idx, ArtifactScan { artifact, result })
            });
        }

        let mut slots: Vec<Option<ArtifactScan>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join.join_next().await {
            let (idx, scan) = joined.map_err(|e| CoreError::TaskFailed {
                message: e.to_string(),
            })?;
            if let Some(log) = &self.log {
                log.append(&record_for(&scan))?;
            }
            slots[idx] = Some(scan);
        }

        let results = slots.into_iter().flatten().collect();
        Ok(RunOutcome {
            results,
            gate: (*self.gate).clone(),
        })
    }
}

/// Scan one artifact across all gated sources in priority order.
async fn scan_artifact(
    provider: &dyn IndexProvider,
    sources: &[IndexSource],
    gate: &GateState,
    artifact: &Artifact,
    audit: bool,
) -> MatchResult {
    let mut scan = ScanEvidence::default();
    let target = MatchTarget::of(artifact);

    for source in sources {
        if gate.excludes(&source.suite) {
            tracing::debug!(
                artifact = %artifact.name,
                source = %source.label(),
                "skipping source under gated suite"
            );
            scan.gated_suite_skipped = true;
            continue;
        }

        let fetched = match provider.fetch(source).await {
            Ok(fetched) => {
                scan.record_attempt(true);
                fetched
            }
            Err(e) => {
                // Absent evidence, recorded for the index_unavailable row.
                tracing::warn!(
                    source = %source.label(),
                    error = %e,
                    "index source unavailable"
                );
                scan.record_attempt(false);
                continue;
            }
        };

        match match_stanzas(parse(&fetched.text), target) {
            SourceScan::Matched(stanza) => {
                tracing::info!(
                    artifact = %artifact.name,
                    version = %artifact.version,
                    source = %source.label(),
                    line = stanza.start_line,
                    "artifact attested by index"
                );
                if audit {
                    write_audit_copy(artifact, source, &fetched).await;
                }
                return MatchResult::Matched {
                    source: source.clone(),
                    stanza,
                };
            }
            SourceScan::NoMatch(evidence) => scan.evidence.merge(evidence),
        }
    }

    let reason = classify(&scan);
    tracing::info!(
        artifact = %artifact.name,
        version = %artifact.version,
        reason = %reason,
        "artifact not attested"
    );
    MatchResult::Unmatched { reason }
}

/// Preserve the matched index blob and its decoded text next to the
/// artifact, named deterministically from (suite, component). Failures are
/// logged, never fatal: the match stands either way.
async fn write_audit_copy(artifact: &Artifact, source: &IndexSource, fetched: &FetchedIndex) {
    let dir = artifact.source_folder();
    let blob_path = dir.join(audit_blob_name(source));
    let text_path = dir.join(audit_index_name(source));

    if let Err(e) = tokio::fs::write(&blob_path, &fetched.raw).await {
        tracing::warn!(path = %blob_path.display(), error = %e, "failed to write audit blob");
    }
    if let Err(e) = tokio::fs::write(&text_path, fetched.text.as_bytes()).await {
        tracing::warn!(path = %text_path.display(), error = %e, "failed to write audit text");
    }
}
