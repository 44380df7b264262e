//! Snapshot Codec — deterministic ChainState encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_state`:  ChainState → JSON string
//! - `decode_state`:  JSON string → ChainState (strict, no defaults)
//! - `restore_state`: decode + invariant validation
//! - `export_state_to_file` / `import_state_from_file`: file I/O
//! - `payload_digest` / `state_digest`: SHA-256 (lowercase hex) of snapshot
//!   payloads and of the JSON encoding

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use xeno_kernel::domain::ChainState;
use xeno_kernel::invariants::{validate_invariants, InvariantViolation};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    Serialization(String),

    #[error("DeserializationError: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Snapshot {sequence} failed its integrity check")]
    Integrity { sequence: u64 },

    #[error("IoError: {0}")]
    Io(#[from] io::Error),
}

/// Encode a ChainState as JSON.
///
/// BTreeMaps keep every key set sorted, so identical states encode to
/// identical bytes.
pub fn encode_state(state: &ChainState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Decode JSON into a ChainState.
///
/// `deny_unknown_fields` on every type rejects unexpected fields and
/// missing fields fail. No invariant validation; use `restore_state`.
pub fn decode_state(json: &str) -> Result<ChainState, SnapshotError> {
    serde_json::from_str::<ChainState>(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))
}

/// Decode and validate invariants. The entry point for untrusted input.
pub fn restore_state(json: &str) -> Result<ChainState, SnapshotError> {
    let state = decode_state(json)?;
    validate_invariants(&state)?;
    Ok(state)
}

pub fn export_state_to_file(state: &ChainState, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_state(state)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_state_from_file(path: &Path) -> Result<ChainState, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_state(&content)
}

/// SHA-256 of raw snapshot payload bytes, lowercase hex.
pub fn payload_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 of the JSON encoding. This is an integrity hash for snapshot
/// files, not the kernel's canonical state hash.
pub fn state_digest(state: &ChainState) -> Result<String, SnapshotError> {
    Ok(payload_digest(encode_state(state)?.as_bytes()))
}
