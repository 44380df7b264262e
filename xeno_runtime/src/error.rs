//! Runtime error type — one enum over every host-side failure.

use std::io;

use thiserror::Error;

use xeno_kernel::error::{ContractError, EngineError};

use crate::proto_bridge::BridgeError;
use crate::snapshot_codec::SnapshotError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid caller: {0}")]
    Caller(ContractError),

    #[error("Query failed: {0}")]
    Query(ContractError),

    #[error("Invalid session id: {0:?}")]
    SessionId(String),

    #[error("Clock error: {0}")]
    Clock(String),

    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("DETERMINISM FAILURE: two replays produced different hashes ({first} vs {second})")]
    Nondeterministic { first: String, second: String },
}
