#![forbid(unsafe_code)]

//! Xeno runtime — host side of the xeno kernel.
//!
//! Wraps the kernel with a protobuf call log, snapshots, replay,
//! session management, a host clock and drift detection.
//!
//! No contract logic lives here; all transitions and invariants are
//! delegated to the kernel.

pub mod call_log;
pub mod clock;
pub mod config;
pub mod drift;
pub mod error;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod snapshot_codec;

pub use error::RuntimeError;
