//! Suite manifest parsing.
//!
//! The signed manifest is a small text file: header fields in `Key: value`
//! form, then a `SHA256:` key introducing one indented line per component
//! index, `<hex-digest> <size> <path>`. Parsing is fail-soft: unrecognized
//! or malformed lines are skipped.

use std::collections::HashMap;

/// Digest entry for one component index within a suite manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDigest {
    /// Lowercase hex SHA-256 of the decoded index blob.
    pub sha256: String,

    /// Blob size in bytes, as published.
    pub size: u64,
}

/// Parsed suite manifest.
#[derive(Debug, Clone, Default)]
pub struct SuiteManifestFile {
    /// `Suite:` header value, when present.
    pub suite: Option<String>,

    /// Relative index path (e.g., `main/Index.gz`) to its published digest.
    pub digests: HashMap<String, IndexDigest>,
}

impl SuiteManifestFile {
    /// Digest entry for a component's index, trying the compressed name
    /// first, then the plain one.
    pub fn digest_for(&self, component: &str) -> Option<&IndexDigest> {
        self.digests
            .get(&format!("{component}/Index.gz"))
            .or_else(|| self.digests.get(&format!("{component}/Index")))
    }
}

/// Parse manifest text. Never fails; a manifest that parses to nothing
/// simply provides no digest cross-checks.
pub fn parse_manifest(text: &str) -> SuiteManifestFile {
    let mut manifest = SuiteManifestFile::default();
    let mut in_digest_list = false;

    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.is_empty() {
            continue;
        }

        if line.starts_with(' ') {
            if in_digest_list {
                if let Some((path, digest)) = parse_digest_line(line) {
                    manifest.digests.insert(path, digest);
                } else {
                    tracing::debug!(line = %line.trim(), "skipping malformed digest line");
                }
            }
            continue;
        }

        in_digest_list = false;
        match line.split_once(':') {
            Some(("SHA256", rest)) if rest.trim().is_empty() => in_digest_list = true,
            Some(("Suite", value)) => manifest.suite = Some(value.trim().to_string()),
            Some(_) => {} // other headers are irrelevant here
            None => {
                tracing::debug!(line = %line, "skipping malformed manifest line");
            }
        }
    }

    manifest
}

fn parse_digest_line(line: &str) -> Option<(String, IndexDigest)> {
    let mut parts = line.split_whitespace();
    let hex = parts.next()?;
    let size = parts.next()?.parse::<u64>().ok()?;
    let path = parts.next()?;
    if parts.next().is_some() || hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some((
        path.to_string(),
        IndexDigest {
            sha256: hex.to_ascii_lowercase(),
            size,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST_A: &str =
        "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const DIGEST_B: &str =
        "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn sample() -> String {
        format!(
            "Suite: stable\nDate: Sat, 30 Aug 2026 00:00:00 UTC\nSHA256:\n {DIGEST_A} 1234 main/Index.gz\n {DIGEST_B} 567 extra/Index\n"
        )
    }

    #[test]
    fn parses_suite_and_digest_entries() {
        let manifest = parse_manifest(&sample());
        assert_eq!(manifest.suite.as_deref(), Some("stable"));
        assert_eq!(manifest.digests.len(), 2);
        let entry = manifest.digest_for("main").unwrap();
        assert_eq!(entry.sha256, DIGEST_A);
        assert_eq!(entry.size, 1234);
    }

    #[test]
    fn digest_lookup_falls_back_to_plain_index() {
        let manifest = parse_manifest(&sample());
        let entry = manifest.digest_for("extra").unwrap();
        assert_eq!(entry.sha256, DIGEST_B);
    }

    #[test]
    fn digest_hex_is_normalized_to_lowercase() {
        let upper = DIGEST_A.to_ascii_uppercase();
        let text = format!("SHA256:\n {upper} 10 main/Index.gz\n");
        let manifest = parse_manifest(&text);
        assert_eq!(manifest.digest_for("main").unwrap().sha256, DIGEST_A);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = format!(
            "Suite: stable\nSHA256:\n not-a-digest 12 main/Index.gz\n {DIGEST_A} huge main/Index.gz\n {DIGEST_A} 12 main/Index.gz\n"
        );
        let manifest = parse_manifest(&text);
        assert_eq!(manifest.digests.len(), 1);
    }

    #[test]
    fn indented_lines_outside_digest_list_are_ignored() {
        let text = format!(" {DIGEST_A} 12 main/Index.gz\nSuite: stable\n");
        let manifest = parse_manifest(&text);
        assert!(manifest.digests.is_empty());
        assert_eq!(manifest.suite.as_deref(), Some("stable"));
    }

    #[test]
    fn empty_manifest_parses_to_nothing() {
        let manifest = parse_manifest("");
        assert!(manifest.suite.is_none());
        assert!(manifest.digests.is_empty());
    }
}
