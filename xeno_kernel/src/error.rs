/// Xeno kernel — Error Types
///
/// Two layers:
///   - `ContractError`: a call was included but its contract rejected it.
///     State is unchanged, the receipt carries the error.
///   - `EngineError`: the envelope itself was refused. Nothing is included.

use std::fmt;

use thiserror::Error;

use crate::invariants::InvariantViolation;

/// Entity kinds that lookups can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Telescope,
    Protocol,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Telescope => f.write_str("Telescope"),
            Entity::Protocol => f.write_str("Protocol"),
        }
    }
}

/// Contract-level failure of an included call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Protocol not active")]
    NotActive,

    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Invalid amount: {0} (must be positive)")]
    InvalidAmount(u64),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("{field} too long: {len} bytes exceeds {max}")]
    TooLong {
        field: &'static str,
        len: u64,
        max: u64,
    },

    #[error("Invalid principal {0:?}")]
    InvalidPrincipal(String),

    #[error("Invalid status {0:?}")]
    InvalidStatus(String),

    #[error("Unknown contract {0:?}")]
    UnknownContract(String),

    #[error("Unknown function {function:?} on {contract}")]
    UnknownFunction { contract: String, function: String },

    #[error("Bad arguments for {function}: {reason}")]
    BadArguments { function: String, reason: String },
}

/// Envelope-level refusal. The call is not included and the sequence
/// does not advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Schema version mismatch: expected {expected}, got {got}")]
    SchemaVersion { expected: u32, got: u32 },

    #[error("Sequence violation: expected {expected}, got {got}")]
    Sequence { expected: u64, got: u64 },

    #[error("Clock regression: block time {got} precedes {last}")]
    ClockRegression { last: u64, got: u64 },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("Invalid genesis: {0}")]
    Genesis(ContractError),
}
