//! Acquisition configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{IndexError, IndexResult};

/// Default per-retrieval timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default max retries for transient failures.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the index acquisition layer.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Mirror base URL; index blobs live at
    /// `{base}/{suite}/{component}/Index.gz` and suite manifests at
    /// `{base}/{suite}/Manifest`.
    pub base_url: String,

    /// Per-retrieval timeout. A timed-out retrieval makes that single source
    /// unavailable, never the whole run.
    pub timeout: Duration,

    /// Max retries for transient failures.
    pub max_retries: u32,

    /// On-disk cache directory for downloaded index blobs.
    pub cache_dir: PathBuf,
}

impl IndexConfig {
    /// Build a config for the given mirror base URL with defaults for
    /// everything else.
    pub fn new(base_url: impl Into<String>) -> IndexResult<Self> {
        Ok(Self {
            base_url: normalize_base(base_url.into())?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            cache_dir: default_cache_dir()?,
        })
    }

    /// Build a config from the environment:
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `VERIDEX_MIRROR_URL` | Mirror base URL (required) |
    /// | `VERIDEX_TIMEOUT` | Per-retrieval timeout in seconds (default: 30) |
    /// | `VERIDEX_MAX_RETRIES` | Max retries for transient failures (default: 3) |
    /// | `VERIDEX_CACHE_DIR` | Index blob cache directory (default: `~/.veridex/cache/index`) |
    pub fn from_env() -> IndexResult<Self> {
        let base_url = std::env::var("VERIDEX_MIRROR_URL").map_err(|_| IndexError::Config {
            message: "VERIDEX_MIRROR_URL is not set".to_string(),
        })?;
        let mut config = Self::new(base_url)?;

        if let Ok(secs) = std::env::var("VERIDEX_TIMEOUT") {
            let secs = secs.parse::<u64>().map_err(|_| IndexError::Config {
                message: format!("invalid VERIDEX_TIMEOUT: {secs}"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(retries) = std::env::var("VERIDEX_MAX_RETRIES") {
            config.max_retries = retries.parse::<u32>().map_err(|_| IndexError::Config {
                message: format!("invalid VERIDEX_MAX_RETRIES: {retries}"),
            })?;
        }
        if let Ok(dir) = std::env::var("VERIDEX_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// URL of a suite/component index blob.
    pub fn index_url(&self, suite: &str, component: &str) -> String {
        format!("{}/{}/{}/Index.gz", self.base_url, suite, component)
    }

    /// URL of the uncompressed fallback index blob.
    pub fn plain_index_url(&self, suite: &str, component: &str) -> String {
        format!("{}/{}/{}/Index", self.base_url, suite, component)
    }

    /// URL of a suite's signed manifest.
    pub fn manifest_url(&self, suite: &str) -> String {
        format!("{}/{}/Manifest", self.base_url, suite)
    }

    /// URL of a suite manifest's detached signature.
    pub fn signature_url(&self, suite: &str) -> String {
        format!("{}/{}/Manifest.sig", self.base_url, suite)
    }
}

fn normalize_base(base: String) -> IndexResult<String> {
    let parsed = url::Url::parse(&base).map_err(|e| IndexError::Config {
        message: format!("invalid mirror URL {base}: {e}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(IndexError::Config {
            message: format!("unsupported mirror URL scheme: {}", parsed.scheme()),
        });
    }
    Ok(base.trim_end_matches('/').to_string())
}

fn default_cache_dir() -> IndexResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".veridex").join("cache").join("index"))
        .ok_or_else(|| IndexError::Config {
            message: "could not determine home directory for cache".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized_without_trailing_slash() {
        let config = IndexConfig::new("https://mirror.example/repo/").unwrap();
        assert_eq!(config.base_url, "https://mirror.example/repo");
        assert_eq!(
            config.index_url("stable", "main"),
            "https://mirror.example/repo/stable/main/Index.gz"
        );
        assert_eq!(
            config.manifest_url("stable"),
            "https://mirror.example/repo/stable/Manifest"
        );
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let result = IndexConfig::new("ftp://mirror.example/repo");
        assert!(matches!(result, Err(IndexError::Config { .. })));
    }

    #[test]
    fn garbage_url_is_rejected() {
        assert!(matches!(
            IndexConfig::new("not a url"),
            Err(IndexError::Config { .. })
        ));
    }
}
