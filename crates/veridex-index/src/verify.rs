//! Detached signature verification against the trusted keyring.
//!
//! Implements the engine's `SignatureVerifier` capability: Ed25519 over the
//! raw manifest bytes, detached signature fetched alongside the manifest.
//! Fails closed: anything that cannot be positively verified is false.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Verifier};
use veridex_core::SignatureVerifier;

use crate::keyring::Keyring;

/// Raw Ed25519 signature length in bytes.
const SIGNATURE_LEN: usize = 64;

/// Verifies suite manifests with the configured trusted keyring.
#[derive(Debug, Clone)]
pub struct KeyringVerifier {
    keyring: Keyring,
}

impl KeyringVerifier {
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }
}

impl SignatureVerifier for KeyringVerifier {
    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let signature = match decode_signature(signature) {
            Some(sig) => sig,
            None => {
                tracing::warn!("malformed detached signature");
                return false;
            }
        };

        for trusted in self.keyring.keys() {
            if trusted.key.verify(payload, &signature).is_ok() {
                tracing::debug!(key_id = %trusted.key_id, "manifest signature verified");
                return true;
            }
        }

        tracing::warn!("manifest signature did not verify against any trusted key");
        false
    }
}

/// Accept either raw 64-byte signatures or a Base64 text encoding of them.
fn decode_signature(bytes: &[u8]) -> Option<Signature> {
    if bytes.len() == SIGNATURE_LEN {
        return Signature::from_slice(bytes).ok();
    }

    let text = std::str::from_utf8(bytes).ok()?;
    let decoded = BASE64.decode(text.trim()).ok()?;
    Signature::from_slice(&decoded).ok()
}
