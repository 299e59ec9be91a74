//! Index acquisition for veridex: HTTP retrieval with retry and backoff,
//! gzip decode, an on-disk blob cache, suite manifest fetch, and
//! detached-signature verification against a local keyring.
//!
//! This crate supplies the network-facing collaborators the engine in
//! `veridex-core` is generic over. [`HttpIndexProvider`] implements both
//! `IndexProvider` and `ManifestProvider`; [`KeyringVerifier`] implements
//! `SignatureVerifier`.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod keyring;
pub mod manifest;
pub mod verify;

pub use cache::IndexCache;
pub use config::IndexConfig;
pub use error::{IndexError, IndexResult};
pub use fetch::{decode_index_blob, HttpIndexProvider};
pub use keyring::{Keyring, TrustedKey};
pub use manifest::{parse_manifest, IndexDigest, SuiteManifestFile};
pub use verify::KeyringVerifier;
