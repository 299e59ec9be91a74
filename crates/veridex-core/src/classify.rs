//! Reason classifier for unmatched artifacts.
//!
//! Evaluated exactly once per artifact, after the scan orchestrator exhausts
//! all gated sources without a match. The precedence surfaces the most
//! security-relevant explanation first, so operators triage tampered-artifact
//! signals before benign "not yet published" signals.

use crate::model::{PartialEvidence, ReasonCode};

/// Everything the classifier may consult, accumulated by the scan
/// orchestrator across all sources of one artifact. No ambient state: this
/// struct is the complete input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanEvidence {
    /// Sources whose retrieval was actually attempted (gated skips are not
    /// attempts).
    pub sources_attempted: usize,

    /// Attempted sources whose index blob was retrieved and decoded.
    pub sources_retrieved: usize,

    /// At least one source was never scanned because its suite failed the
    /// gate. Only ever set on non-forced runs.
    pub gated_suite_skipped: bool,

    /// Partial-match evidence folded across all scanned sources.
    pub evidence: PartialEvidence,
}

impl ScanEvidence {
    /// Record one retrieval attempt and whether it produced a decoded blob.
    pub fn record_attempt(&mut self, retrieved: bool) {
        self.sources_attempted += 1;
        if retrieved {
            self.sources_retrieved += 1;
        }
    }
}

/// Derive the single reason code for a non-match. Decision table, top-down,
/// first applicable wins:
///
/// 1. retrieval was attempted and no blob was ever decoded -> `index_unavailable`
/// 2. a gated suite kept sources from being scanned at all -> `gated_suite_skipped`
/// 3. name and version were attested together somewhere    -> `hash_mismatch`
/// 4. the name was seen anywhere                           -> `version_not_found`
/// 5. otherwise                                            -> `not_found`
pub fn classify(scan: &ScanEvidence) -> ReasonCode {
    if scan.sources_attempted > 0 && scan.sources_retrieved == 0 {
        ReasonCode::IndexUnavailable
    } else if scan.gated_suite_skipped {
        ReasonCode::GatedSuiteSkipped
    } else if scan.evidence.name_version_seen {
        ReasonCode::HashMismatch
    } else if scan.evidence.name_seen {
        ReasonCode::VersionNotFound
    } else {
        ReasonCode::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(name_seen: bool, name_version_seen: bool) -> PartialEvidence {
        PartialEvidence {
            name_seen,
            name_version_seen,
        }
    }

    #[test]
    fn nothing_retrieved_is_index_unavailable() {
        let scan = ScanEvidence {
            sources_attempted: 3,
            sources_retrieved: 0,
            gated_suite_skipped: false,
            evidence: PartialEvidence::default(),
        };
        assert_eq!(classify(&scan), ReasonCode::IndexUnavailable);
    }

    #[test]
    fn index_unavailable_outranks_gating() {
        // Every attempted retrieval failed and a suite was also gated: the
        // table's first row wins.
        let scan = ScanEvidence {
            sources_attempted: 2,
            sources_retrieved: 0,
            gated_suite_skipped: true,
            evidence: PartialEvidence::default(),
        };
        assert_eq!(classify(&scan), ReasonCode::IndexUnavailable);
    }

    #[test]
    fn gated_skip_with_no_attempts_is_gated_suite_skipped() {
        // The only configured suite failed the gate: nothing was attempted.
        let scan = ScanEvidence {
            sources_attempted: 0,
            sources_retrieved: 0,
            gated_suite_skipped: true,
            evidence: PartialEvidence::default(),
        };
        assert_eq!(classify(&scan), ReasonCode::GatedSuiteSkipped);
    }

    #[test]
    fn gated_skip_outranks_partial_evidence() {
        // A gated suite kept sources from being scanned, so the gating
        // explanation takes priority over hash evidence from the suites that
        // were scanned.
        let scan = ScanEvidence {
            sources_attempted: 1,
            sources_retrieved: 1,
            gated_suite_skipped: true,
            evidence: evidence(true, true),
        };
        assert_eq!(classify(&scan), ReasonCode::GatedSuiteSkipped);
    }

    #[test]
    fn all_suites_scanned_hash_only_failure_is_hash_mismatch() {
        // No gating occurred; name+version attested but the hash differed.
        let scan = ScanEvidence {
            sources_attempted: 2,
            sources_retrieved: 2,
            gated_suite_skipped: false,
            evidence: evidence(true, true),
        };
        assert_eq!(classify(&scan), ReasonCode::HashMismatch);
    }

    #[test]
    fn name_only_is_version_not_found() {
        let scan = ScanEvidence {
            sources_attempted: 1,
            sources_retrieved: 1,
            gated_suite_skipped: false,
            evidence: evidence(true, false),
        };
        assert_eq!(classify(&scan), ReasonCode::VersionNotFound);
    }

    #[test]
    fn nothing_seen_is_not_found() {
        let scan = ScanEvidence {
            sources_attempted: 1,
            sources_retrieved: 1,
            gated_suite_skipped: false,
            evidence: PartialEvidence::default(),
        };
        assert_eq!(classify(&scan), ReasonCode::NotFound);
    }

    #[test]
    fn empty_source_list_falls_through_to_not_found() {
        assert_eq!(classify(&ScanEvidence::default()), ReasonCode::NotFound);
    }

    #[test]
    fn partial_retrieval_failure_does_not_mask_evidence() {
        // One source unreachable, one scanned with a name hit: the evidence
        // row applies because something was retrieved.
        let mut scan = ScanEvidence::default();
        scan.record_attempt(false);
        scan.record_attempt(true);
        scan.evidence.merge(evidence(true, false));
        assert_eq!(classify(&scan), ReasonCode::VersionNotFound);
    }
}
