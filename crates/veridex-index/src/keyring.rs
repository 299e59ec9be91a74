//! Trusted keyring for suite manifest verification.
//!
//! Keys are Ed25519 public keys in SPKI form, loaded from a file or a
//! directory of `*.pub` files. Each file holds either PEM
//! (`-----BEGIN PUBLIC KEY-----`) or a single Base64 line of the SPKI DER.
//! Key IDs are the SHA-256 of the SPKI DER, lowercase hex.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::VerifyingKey;
use pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

use crate::error::{IndexError, IndexResult};

/// One trusted key with its identifier.
#[derive(Debug, Clone)]
pub struct TrustedKey {
    /// `sha256:<hex>` over the SPKI DER.
    pub key_id: String,
    pub key: VerifyingKey,
}

/// The configured trusted keyring. Empty keyrings are rejected at load time:
/// a run without trust anchors cannot verify anything and must fail closed.
#[derive(Debug, Clone)]
pub struct Keyring {
    keys: Vec<TrustedKey>,
}

impl Keyring {
    /// Load from a key file or a directory of `*.pub` files.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let mut keys = Vec::new();

        if path.is_dir() {
            let mut entries: Vec<_> = std::fs::read_dir(path)
                .map_err(|e| config_err(path, &e.to_string()))?
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "pub"))
                .collect();
            entries.sort();
            for entry in entries {
                keys.push(load_key_file(&entry)?);
            }
        } else {
            keys.push(load_key_file(path)?);
        }

        if keys.is_empty() {
            return Err(config_err(path, "trusted keyring is empty"));
        }

        for key in &keys {
            tracing::debug!(key_id = %key.key_id, "loaded trusted key");
        }
        Ok(Self { keys })
    }

    /// All trusted keys.
    pub fn keys(&self) -> &[TrustedKey] {
        &self.keys
    }

    /// Number of trusted keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the keyring holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn load_key_file(path: &Path) -> IndexResult<TrustedKey> {
    let text = std::fs::read_to_string(path).map_err(|e| config_err(path, &e.to_string()))?;
    let trimmed = text.trim();

    let key = if trimmed.starts_with("-----BEGIN") {
        VerifyingKey::from_public_key_pem(trimmed)
            .map_err(|e| config_err(path, &format!("invalid PEM public key: {e}")))?
    } else {
        let der = BASE64
            .decode(trimmed)
            .map_err(|e| config_err(path, &format!("invalid base64 public key: {e}")))?;
        VerifyingKey::from_public_key_der(&der)
            .map_err(|e| config_err(path, &format!("invalid SPKI public key: {e}")))?
    };

    Ok(TrustedKey {
        key_id: compute_key_id(&key)?,
        key,
    })
}

/// Compute a key's identifier: `sha256:` plus the hex digest of its SPKI
/// DER encoding.
pub fn compute_key_id(key: &VerifyingKey) -> IndexResult<String> {
    use pkcs8::EncodePublicKey;
    let der = key.to_public_key_der().map_err(|e| IndexError::Config {
        message: format!("failed to encode public key: {e}"),
    })?;
    Ok(format!("sha256:{}", hex::encode(Sha256::digest(der.as_bytes()))))
}

fn config_err(path: &Path, message: &str) -> IndexError {
    IndexError::Config {
        message: format!("keyring {}: {message}", path.display()),
    }
}
