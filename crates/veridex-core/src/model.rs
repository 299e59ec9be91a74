//! Data model for the provenance engine.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One local package artifact under scan. Immutable once read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Package name (e.g., "libfoo").
    pub name: String,

    /// Package version string, compared verbatim.
    pub version: String,

    /// Target architecture (informational, carried into the result record).
    pub architecture: String,

    /// SHA-256 content digest, canonical lowercase hex.
    pub hash: String,

    /// Path of the local file this artifact was read from.
    pub source_path: PathBuf,
}

impl Artifact {
    /// Build an artifact, normalizing the hash to canonical lowercase hex.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        architecture: impl Into<String>,
        hash: &str,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            architecture: architecture.into(),
            hash: hash.to_ascii_lowercase(),
            source_path: source_path.into(),
        }
    }

    /// Directory the artifact file lives in, for the result record and the
    /// audit side artifact.
    pub fn source_folder(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name component of the source path.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Identifies one retrievable index blob. Iteration order across sources is
/// significant and caller-supplied: suites-list order times components-list
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSource {
    /// Release channel / pocket name.
    pub suite: String,

    /// Sub-category within the suite (e.g., "main").
    pub component: String,

    /// Where the index blob is retrieved from.
    pub origin_url: String,
}

impl IndexSource {
    /// `suite/component` label used in logs and result records.
    pub fn label(&self) -> String {
        format!("{}/{}", self.suite, self.component)
    }

    /// Deterministic single-path-component file stem for audit copies and
    /// cache entries. Path separators and whitespace collapse to `_`.
    pub fn file_stem(&self) -> String {
        let raw = format!("{}_{}", self.suite, self.component);
        raw.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | ' ' => '_',
                other => other,
            })
            .collect()
    }
}

/// One blank-line-delimited record of an index blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    /// 1-based line number of the stanza's first content line.
    pub start_line: usize,

    /// Field key to raw value. Duplicate keys are last-write-wins.
    pub fields: HashMap<String, String>,
}

impl Stanza {
    /// Look up a field by exact key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Closed enumeration explaining why an artifact was not matched against any
/// trusted index. Stable strings; downstream tooling branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// No source's index blob could be retrieved or decoded at all.
    IndexUnavailable,

    /// At least one source was never scanned because its suite failed the
    /// gate and the run was not a forced retry.
    GatedSuiteSkipped,

    /// Name and version were attested together in some stanza, but the hash
    /// differs. Strongest signal of a tampered or rebuilt artifact.
    HashMismatch,

    /// The name was seen somewhere, but never with this version.
    VersionNotFound,

    /// The name was not seen in any scanned source.
    NotFound,
}

impl ReasonCode {
    /// Stable snake_case form used in result records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndexUnavailable => "index_unavailable",
            Self::GatedSuiteSkipped => "gated_suite_skipped",
            Self::HashMismatch => "hash_mismatch",
            Self::VersionNotFound => "version_not_found",
            Self::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scanning one artifact across all gated sources. Exactly one per
/// artifact per run.
#[derive(Debug, Clone)]
pub enum MatchResult {
    /// All three fields matched within a single stanza of this source.
    Matched {
        source: IndexSource,
        stanza: Stanza,
    },

    /// No source yielded a full match; `reason` explains why.
    Unmatched { reason: ReasonCode },
}

impl MatchResult {
    /// Whether this is a full match.
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Partial-match evidence accumulated per artifact across all scanned
/// sources. Monotonic within a run: once a flag is true it stays true until
/// the classifier consumes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialEvidence {
    /// Some stanza matched on name, regardless of version or hash.
    pub name_seen: bool,

    /// Some single stanza matched on name and version together, regardless
    /// of hash.
    pub name_version_seen: bool,
}

impl PartialEvidence {
    /// Fold evidence from one source scan into the running per-artifact
    /// evidence. Flags only ever go from false to true.
    pub fn merge(&mut self, other: PartialEvidence) {
        self.name_seen |= other.name_seen;
        self.name_version_seen |= other.name_version_seen;
    }
}

/// Which suites passed or failed signature verification this run. Computed
/// once before scanning begins and read-only thereafter; the retry controller
/// constructs a fresh, narrowed state instead of mutating this one.
#[derive(Debug, Clone, Default)]
pub struct GateState {
    /// Suites whose signed manifest verified against the trusted keyring.
    pub verified: BTreeSet<String>,

    /// Suites excluded from scanning: manifest unretrievable or signature
    /// verification failed. Suite-scoped, so every component under a failed
    /// suite is skipped.
    pub failed: BTreeSet<String>,

    /// Forced-retry mode: the gate step was bypassed and the named suites
    /// are unconditionally included.
    pub forced: bool,
}

impl GateState {
    /// Gate state for a forced retry scoped to explicitly named suites. The
    /// operator has accepted the trust risk; nothing is excluded.
    pub fn forced(suites: impl IntoIterator<Item = String>) -> Self {
        Self {
            verified: suites.into_iter().collect(),
            failed: BTreeSet::new(),
            forced: true,
        }
    }

    /// Whether sources under this suite must be skipped.
    pub fn excludes(&self, suite: &str) -> bool {
        !self.forced && self.failed.contains(suite)
    }

    /// Failed suites in stable order, for the retry offer and run report.
    pub fn failed_suites(&self) -> Vec<String> {
        self.failed.iter().cloned().collect()
    }
}

/// One row of the result log, one per artifact per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Directory the artifact file lives in. The result set is sorted by
    /// this field for stable presentation.
    pub source_folder: String,

    /// Artifact file name.
    pub filename: String,

    /// Artifact name.
    pub name: String,

    /// Artifact version.
    pub version: String,

    /// Artifact architecture.
    pub architecture: String,

    /// Artifact content hash (lowercase hex).
    pub hash: String,

    /// Whether a full three-field match was found.
    pub match_found: bool,

    /// `suite/component` of the matching source; empty if unmatched.
    #[serde(default)]
    pub matched_source: String,

    /// Deterministic file name of the preserved index copy; empty if
    /// unmatched.
    #[serde(default)]
    pub matched_index: String,

    /// Start line of the matched stanza; empty if unmatched.
    #[serde(default)]
    pub matched_line: Option<usize>,

    /// Reason code when unmatched; empty if matched.
    #[serde(default)]
    pub reason: Option<ReasonCode>,
}
