//! Error types for the provenance engine.
//!
//! Per-source and per-artifact failures never surface here: they are absorbed
//! into reason codes by the scan orchestrator. Only total inability to
//! proceed is an error.

/// Engine errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No artifacts were supplied; there is nothing to verify.
    #[error("no artifacts supplied")]
    NoArtifacts,

    /// A scan worker task failed to join (panic or cancellation).
    #[error("scan task failed: {message}")]
    TaskFailed { message: String },

    /// The result log could not be written.
    #[error("result log error: {message}")]
    ResultLog { message: String },
}

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;
