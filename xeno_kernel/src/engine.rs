/// Xeno kernel — Engine
///
/// Top-level orchestrator. Delegates contract logic to transitions,
/// validates via invariants, commits only whole calls.
///
/// Envelope rules: schema version 1, strictly contiguous sequence,
/// non-decreasing block time.

use serde_json::Value;
use tracing::{debug, warn};

use crate::call::{CallEnvelope, CallReceipt, SCHEMA_VERSION};
use crate::domain::{ChainState, GenesisConfig};
use crate::error::{ContractError, EngineError};
use crate::hashing::canonical_hash;
use crate::invariants::validate_invariants;
use crate::state::create_initial_state;
use crate::transitions::{apply_call as transition_apply, query as transition_query};

/// Stateful engine wrapping the pure transition layer.
#[derive(Debug, Clone)]
pub struct Engine {
    state: ChainState,
    last_sequence: u64,
    last_block_time: u64,
}

impl Engine {
    /// Create an engine at genesis.
    pub fn new(genesis: &GenesisConfig) -> Result<Self, EngineError> {
        let state = create_initial_state(genesis).map_err(EngineError::Genesis)?;
        Ok(Self {
            state,
            last_sequence: 0,
            last_block_time: 0,
        })
    }

    /// Resume from a previously committed state (e.g. a snapshot).
    /// The state is validated before it is accepted.
    pub fn restore(
        state: ChainState,
        last_sequence: u64,
        last_block_time: u64,
    ) -> Result<Self, EngineError> {
        validate_invariants(&state)?;
        Ok(Self {
            state,
            last_sequence,
            last_block_time,
        })
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn next_sequence(&self) -> u64 {
        self.last_sequence + 1
    }

    pub fn last_block_time(&self) -> u64 {
        self.last_block_time
    }

    pub fn state_hash(&self) -> String {
        canonical_hash(&self.state)
    }

    /// Apply a single call:
    ///   1. Validate schema version, sequence and block time
    ///   2. Delegate to transitions.apply_call on a clone of the state
    ///   3. Validate invariants on the candidate state
    ///   4. Commit, advance sequence/clock, return the receipt
    ///
    /// A contract failure is still included: the receipt carries the
    /// error and the state is left as it was.
    pub fn apply_call(&mut self, call: &CallEnvelope) -> Result<CallReceipt, EngineError> {
        self.check_envelope(call).inspect_err(|err| {
            warn!(sequence = call.sequence, error = %err, "call refused");
        })?;

        let (outcome, events) = match transition_apply(&self.state, call) {
            Ok(transition) => {
                validate_invariants(&transition.state)?;
                self.state = transition.state;
                (Ok(transition.value), transition.events)
            }
            Err(err) => (Err(err), Vec::new()),
        };

        self.last_sequence = call.sequence;
        self.last_block_time = call.block_time;

        match &outcome {
            Ok(_) => debug!(
                sequence = call.sequence,
                contract = %call.contract,
                function = %call.function,
                caller = %call.caller,
                events = events.len(),
                "call committed"
            ),
            Err(err) => debug!(
                sequence = call.sequence,
                contract = %call.contract,
                function = %call.function,
                caller = %call.caller,
                error = %err,
                "call failed"
            ),
        }

        Ok(CallReceipt {
            sequence: call.sequence,
            contract: call.contract.clone(),
            function: call.function.clone(),
            outcome,
            events,
        })
    }

    /// Apply an ordered sequence of calls, stopping at the first refusal.
    pub fn apply_sequence(&mut self, calls: &[CallEnvelope]) -> Result<Vec<CallReceipt>, EngineError> {
        calls.iter().map(|call| self.apply_call(call)).collect()
    }

    /// Evaluate a read-only function against the committed state.
    pub fn query(&self, contract: &str, function: &str, args: &[Value]) -> Result<Value, ContractError> {
        transition_query(&self.state, contract, function, args)
    }

    fn check_envelope(&self, call: &CallEnvelope) -> Result<(), EngineError> {
        if call.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaVersion {
                expected: SCHEMA_VERSION,
                got: call.schema_version,
            });
        }
        let expected = self.next_sequence();
        if call.sequence != expected {
            return Err(EngineError::Sequence {
                expected,
                got: call.sequence,
            });
        }
        if call.block_time < self.last_block_time {
            return Err(EngineError::ClockRegression {
                last: self.last_block_time,
                got: call.block_time,
            });
        }
        Ok(())
    }
}
