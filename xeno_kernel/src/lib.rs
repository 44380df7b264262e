#![forbid(unsafe_code)]

/// Kernel v1. Behavioural changes that alter canonical hashes require a
/// version bump.
pub const KERNEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod args;
pub mod call;
pub mod domain;
pub mod engine;
pub mod error;
pub mod governance;
pub mod hashing;
pub mod invariants;
pub mod ledger;
pub mod registry;
pub mod scenario;
pub mod state;
pub mod transitions;
