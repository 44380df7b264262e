//! Replay orchestrator — rebuild state from the call log.
//!
//! Delegates all contract logic to the kernel.
//! No shortcuts, no cached state logic.

use xeno_kernel::call::{CallEnvelope, CallReceipt};
use xeno_kernel::domain::{ChainState, GenesisConfig};
use xeno_kernel::engine::Engine;
use xeno_kernel::error::EngineError;

/// Run every call through a fresh engine at genesis.
pub fn replay(genesis: &GenesisConfig, calls: &[CallEnvelope]) -> Result<(Engine, Vec<CallReceipt>), EngineError> {
    let mut engine = Engine::new(genesis)?;
    let receipts = engine.apply_sequence(calls)?;
    Ok((engine, receipts))
}

/// Rebuild the chain state from genesis and an ordered call list.
///
/// Returns (final_state, canonical_hash). Deterministic by the kernel's
/// guarantee.
pub fn rebuild_state(
    genesis: &GenesisConfig,
    calls: &[CallEnvelope],
) -> Result<(ChainState, String), EngineError> {
    let (engine, _) = replay(genesis, calls)?;
    let hash = engine.state_hash();
    Ok((engine.state().clone(), hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(genesis: &GenesisConfig, calls: &[CallEnvelope]) -> Result<String, EngineError> {
    rebuild_state(genesis, calls).map(|(_, hash)| hash)
}
