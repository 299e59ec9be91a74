//! Tuple matcher: joint name/version/hash equality within a single stanza.
//!
//! Comparison is exact string equality only. Artifact-derived values are
//! never interpreted as a pattern, so characters that would be special in a
//! pattern language (`.`, `*`, `+`, `[`) have no effect. The one permitted
//! tolerance is hash case: digests are compared on their canonical lowercase
//! hex form.

use crate::model::{Artifact, PartialEvidence, Stanza};

/// Index field holding the package name.
pub const FIELD_NAME: &str = "Name";
/// Index field holding the package version.
pub const FIELD_VERSION: &str = "Version";
/// Index field holding the content digest.
pub const FIELD_HASH: &str = "Hash";

/// The three-field tuple an index record must jointly attest.
#[derive(Debug, Clone, Copy)]
pub struct MatchTarget<'a> {
    pub name: &'a str,
    pub version: &'a str,
    /// Canonical lowercase hex digest.
    pub hash: &'a str,
}

impl<'a> MatchTarget<'a> {
    /// Target tuple of an artifact. The artifact's hash is already canonical
    /// lowercase (normalized on construction).
    pub fn of(artifact: &'a Artifact) -> Self {
        Self {
            name: &artifact.name,
            version: &artifact.version,
            hash: &artifact.hash,
        }
    }
}

/// Outcome of scanning one source's stanza stream.
#[derive(Debug, Clone)]
pub enum SourceScan {
    /// First stanza (lowest start line) where all three fields hold.
    Matched(Stanza),

    /// No full match; partial evidence gathered while scanning.
    NoMatch(PartialEvidence),
}

/// Stream stanzas in order and return the first full match, short-circuiting
/// the rest of the source. Partial evidence accumulates independently of the
/// match outcome and is returned on no-match for the caller to fold into the
/// artifact's running evidence.
pub fn match_stanzas(
    stanzas: impl Iterator<Item = Stanza>,
    target: MatchTarget<'_>,
) -> SourceScan {
    let mut evidence = PartialEvidence::default();

    for stanza in stanzas {
        let name_eq = stanza.field(FIELD_NAME) == Some(target.name);
        if !name_eq {
            continue;
        }
        evidence.name_seen = true;

        let version_eq = stanza.field(FIELD_VERSION) == Some(target.version);
        if !version_eq {
            continue;
        }
        evidence.name_version_seen = true;

        if hash_eq(stanza.field(FIELD_HASH), target.hash) {
            return SourceScan::Matched(stanza);
        }
    }

    SourceScan::NoMatch(evidence)
}

/// Byte-for-byte digest comparison on the canonical lowercase hex form.
fn hash_eq(field: Option<&str>, target_lowercase: &str) -> bool {
    match field {
        Some(value) => value.to_ascii_lowercase() == target_lowercase,
        None => false,
    }
}
