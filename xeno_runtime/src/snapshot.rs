//! Snapshot layer — deterministic state snapshots.
//!
//! A snapshot carries the strict JSON encoding of the state plus two
//! hashes: a SHA-256 of that JSON (file integrity) and the kernel's
//! canonical state hash (agreement with replay). No wall-clock
//! timestamps in snapshot content; `block_time` is the chain clock.
//!
//! If a snapshot fails verification, callers fall back to an older one
//! or to full replay.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use xeno_kernel::domain::ChainState;
use xeno_kernel::engine::Engine;
use xeno_kernel::hashing::canonical_hash;
use xeno_kernel::KERNEL_VERSION;

use crate::snapshot_codec::{encode_state, payload_digest, restore_state, SnapshotError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Sequence of the last call included in this state.
    pub sequence: u64,
    /// Block time of that call.
    pub block_time: u64,
    pub kernel_version: u32,
    pub state_json: String,
    /// SHA-256 of `state_json`.
    pub hash: String,
    /// Canonical kernel hash of the state.
    pub state_hash: String,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

fn parse_snapshot_name(name: &str) -> Option<u64> {
    name.strip_prefix("snapshot_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Save a snapshot of `state` as of `sequence`.
pub fn save_snapshot(
    dir: &Path,
    sequence: u64,
    block_time: u64,
    state: &ChainState,
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let state_json = encode_state(state)?;
    let snap = Snapshot {
        sequence,
        block_time,
        kernel_version: KERNEL_VERSION,
        hash: payload_digest(state_json.as_bytes()),
        state_hash: canonical_hash(state),
        state_json,
    };

    let content =
        serde_json::to_string(&snap).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

    let path = snapshot_path(dir, sequence);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Load the snapshot taken at `sequence`, if one exists.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, SnapshotError> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap = serde_json::from_str(&content)
        .map_err(|e| SnapshotError::Deserialization(format!("Bad snapshot {}: {}", sequence, e)))?;
    Ok(Some(snap))
}

/// Sequences of every snapshot file in `dir`, newest first.
pub fn list_snapshots(dir: &Path) -> Result<Vec<u64>, SnapshotError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sequences = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(seq) = parse_snapshot_name(&name.to_string_lossy()) {
            sequences.push(seq);
        }
    }
    sequences.sort_unstable_by(|a, b| b.cmp(a));
    Ok(sequences)
}

/// Load the snapshot with the highest sequence in `dir`.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match list_snapshots(dir)?.first() {
        Some(&seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// Check the integrity hash against the embedded state JSON.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    payload_digest(snap.state_json.as_bytes()) == snap.hash
}

/// Verify and decode a snapshot into a state.
///
/// Fails on integrity mismatch, kernel version mismatch, invariant
/// violation, or disagreement with the recorded canonical hash.
pub fn restore_snapshot(snap: &Snapshot) -> Result<ChainState, SnapshotError> {
    if snap.kernel_version != KERNEL_VERSION || !verify_snapshot_hash(snap) {
        return Err(SnapshotError::Integrity {
            sequence: snap.sequence,
        });
    }
    let state = restore_state(&snap.state_json)?;
    if canonical_hash(&state) != snap.state_hash {
        return Err(SnapshotError::Integrity {
            sequence: snap.sequence,
        });
    }
    Ok(state)
}

/// Resume an engine from a verified snapshot.
pub fn restore_engine(snap: &Snapshot) -> Result<Engine, SnapshotError> {
    let state = restore_snapshot(snap)?;
    Engine::restore(state, snap.sequence, snap.block_time).map_err(|_| SnapshotError::Integrity {
        sequence: snap.sequence,
    })
}
