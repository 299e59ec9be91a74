//! Unified exit codes for veridex.
//! These codes are part of the public contract; CI pipelines branch on them.

pub const SUCCESS: i32 = 0;
pub const UNMATCHED: i32 = 1; // At least one artifact had no attested match
pub const CONFIG_ERROR: i32 = 2; // Bad invocation, keyring, or mirror config
pub const GATE_FAILED: i32 = 3; // A suite manifest failed signature verification
