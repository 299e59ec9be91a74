//! Artifact discovery: walk a directory, derive `(name, version, arch)`
//! from the `<name>_<version>_<arch>.<ext>` file name convention, and hash
//! file contents.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use veridex_core::Artifact;

/// File names veridex itself writes next to artifacts. Never treated as
/// artifacts on a later run.
fn is_own_output(name: &str) -> bool {
    name.ends_with(".index") || name.ends_with(".index.txt") || name.ends_with(".csv")
}

/// Split `<name>_<version>_<arch>` out of a file stem. The name may itself
/// contain underscores; the last two segments are version and architecture.
fn split_stem(stem: &str) -> Option<(&str, &str, &str)> {
    let mut parts = stem.rsplitn(3, '_');
    let arch = parts.next()?;
    let version = parts.next()?;
    let name = parts.next()?;
    if name.is_empty() || version.is_empty() || arch.is_empty() {
        return None;
    }
    Some((name, version, arch))
}

fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Discover artifacts under `dir`, sorted by file name for a deterministic
/// scan order. Files that do not follow the naming convention are skipped
/// with a warning rather than failing the run.
pub fn discover(dir: &Path) -> Result<Vec<Artifact>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut artifacts = Vec::new();
    for path in paths {
        let file_name = match path.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => continue,
        };
        if is_own_output(&file_name) {
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some((name, version, arch)) = split_stem(&stem) else {
            tracing::warn!(file = %file_name, "skipping file without name_version_arch stem");
            continue;
        };

        let hash = hash_file(&path)?;
        artifacts.push(Artifact::new(name, version, arch, &hash, &path));
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn splits_conventional_stem() {
        assert_eq!(
            split_stem("openssl_3.0.13_amd64"),
            Some(("openssl", "3.0.13", "amd64"))
        );
    }

    #[test]
    fn name_keeps_its_own_underscores() {
        assert_eq!(
            split_stem("lib_foo_bar_1.0_arm64"),
            Some(("lib_foo_bar", "1.0", "arm64"))
        );
    }

    #[test]
    fn rejects_stems_with_too_few_segments() {
        assert_eq!(split_stem("openssl_3.0.13"), None);
        assert_eq!(split_stem("openssl"), None);
        assert_eq!(split_stem("a__b"), None);
    }

    #[test]
    fn discovers_sorted_and_skips_nonconforming() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zlib_1.3_amd64.pkg"), b"zzz").unwrap();
        fs::write(dir.path().join("bash_5.2_amd64.pkg"), b"bbb").unwrap();
        fs::write(dir.path().join("README"), b"not an artifact").unwrap();
        fs::write(dir.path().join("veridex_results.csv"), b"old run").unwrap();
        fs::write(dir.path().join("stable_main.index.txt"), b"audit copy").unwrap();

        let artifacts = discover(dir.path()).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bash", "zlib"]);
        assert_eq!(artifacts[0].hash, hex::encode(Sha256::digest(b"bbb")));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("nope")).is_err());
    }
}
