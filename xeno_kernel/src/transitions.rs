/// Xeno kernel — Centralized Call Dispatch
///
/// Routes (contract, function, args) to the typed contract operations and
/// encodes their results as JSON values. Read-only functions are shared by
/// `apply_call` and `query`.
///
/// Value conventions:
///   - mutating success: `true`, or the new id for create/register
///   - lookups of missing entities: `null`, never an error

use serde_json::{json, Value};

use crate::args::Args;
use crate::call::{CallEnvelope, Contract, ContractEvent};
use crate::domain::{
    ChainState, GovernanceState, LedgerState, Principal, Protocol, ProtocolStatus,
    RegistryState, Telescope,
};
use crate::error::ContractError;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Successful application of one call.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ChainState,
    pub value: Value,
    pub events: Vec<ContractEvent>,
}

/// Apply *call* to *state*. The original state is never mutated; the call
/// runs against a clone that is returned only on success.
pub fn apply_call(state: &ChainState, call: &CallEnvelope) -> Result<Transition, ContractError> {
    let contract = Contract::resolve(&call.contract)?;
    let args = Args::new(&call.function, &call.args);
    let caller = &call.caller;

    let mut next = state.clone();
    let mut events = Vec::new();

    let value = match contract {
        Contract::Xenotoken => {
            execute_xenotoken(&mut next.ledger, caller, &call.function, &args, &mut events)?
        }
        Contract::TelescopeIntegration => execute_telescope_integration(
            &mut next.registry,
            call.block_time,
            &call.function,
            &args,
            &mut events,
        )?,
        Contract::XenolinguisticProtocol => execute_xenolinguistic_protocol(
            &mut next.governance,
            caller,
            &call.function,
            &args,
            &mut events,
        )?,
    };

    Ok(Transition {
        state: next,
        value,
        events,
    })
}

/// Evaluate a read-only function without a call envelope.
pub fn query(
    state: &ChainState,
    contract: &str,
    function: &str,
    args: &[Value],
) -> Result<Value, ContractError> {
    let args = Args::new(function, args);
    match Contract::resolve(contract)? {
        Contract::Xenotoken => read_xenotoken(&state.ledger, function, &args),
        Contract::TelescopeIntegration => read_telescope_integration(&state.registry, function, &args),
        Contract::XenolinguisticProtocol => {
            read_xenolinguistic_protocol(&state.governance, function, &args)
        }
    }
}

fn unknown(contract: Contract, function: &str) -> ContractError {
    ContractError::UnknownFunction {
        contract: contract.name().to_string(),
        function: function.to_string(),
    }
}

// ---------------------------------------------------------------------------
// xenotoken
// ---------------------------------------------------------------------------

fn execute_xenotoken(
    ledger: &mut LedgerState,
    caller: &Principal,
    function: &str,
    args: &Args<'_>,
    events: &mut Vec<ContractEvent>,
) -> Result<Value, ContractError> {
    match function {
        "mint" => {
            args.expect_len(2)?;
            let amount = args.uint(0)?;
            let recipient = args.principal(1)?;
            ledger.mint(caller, amount, &recipient)?;
            events.push(ContractEvent::Minted { recipient, amount });
            Ok(Value::Bool(true))
        }
        "transfer" => {
            args.expect_len(3)?;
            let amount = args.uint(0)?;
            let sender = args.principal(1)?;
            let recipient = args.principal(2)?;
            ledger.transfer(amount, &sender, &recipient)?;
            events.push(ContractEvent::Transferred {
                sender,
                recipient,
                amount,
            });
            Ok(Value::Bool(true))
        }
        "reward-breakthrough" => {
            args.expect_len(2)?;
            let recipient = args.principal(0)?;
            let amount = args.uint(1)?;
            ledger.reward_breakthrough(caller, &recipient, amount)?;
            events.push(ContractEvent::BreakthroughRewarded { recipient, amount });
            Ok(Value::Bool(true))
        }
        "set-token-uri" => {
            args.expect_len(1)?;
            let uri = args.text(0)?;
            ledger.set_token_uri(caller, uri)?;
            events.push(ContractEvent::TokenUriUpdated {
                uri: uri.to_string(),
            });
            Ok(Value::Bool(true))
        }
        _ => read_xenotoken(ledger, function, args),
    }
}

fn read_xenotoken(
    ledger: &LedgerState,
    function: &str,
    args: &Args<'_>,
) -> Result<Value, ContractError> {
    match function {
        "get-balance" => {
            args.expect_len(1)?;
            let balance = args
                .lookup_principal(0)?
                .map_or(0, |account| ledger.balance_of(&account));
            Ok(json!(balance))
        }
        "get-token-uri" => {
            args.expect_len(0)?;
            Ok(json!(ledger.token_uri()))
        }
        "get-total-supply" => {
            args.expect_len(0)?;
            Ok(json!(ledger.total_supply))
        }
        "get-owner" => {
            args.expect_len(0)?;
            Ok(json!(ledger.owner.as_str()))
        }
        other => Err(unknown(Contract::Xenotoken, other)),
    }
}

// ---------------------------------------------------------------------------
// telescope-integration
// ---------------------------------------------------------------------------

fn execute_telescope_integration(
    registry: &mut RegistryState,
    block_time: u64,
    function: &str,
    args: &Args<'_>,
    events: &mut Vec<ContractEvent>,
) -> Result<Value, ContractError> {
    match function {
        "register-telescope" => {
            args.expect_len(3)?;
            let name = args.text(0)?;
            let id = registry.register_telescope(name, args.text(1)?, args.text(2)?)?;
            events.push(ContractEvent::TelescopeRegistered {
                id,
                name: name.to_string(),
            });
            Ok(json!(id))
        }
        "submit-telescope-data" => {
            args.expect_len(2)?;
            let telescope_id = args.uint(0)?;
            let replaced = registry.submit_data(telescope_id, block_time, args.text(1)?)?;
            events.push(ContractEvent::TelescopeDataSubmitted {
                telescope_id,
                timestamp: block_time,
                replaced,
            });
            Ok(Value::Bool(true))
        }
        _ => read_telescope_integration(registry, function, args),
    }
}

fn read_telescope_integration(
    registry: &RegistryState,
    function: &str,
    args: &Args<'_>,
) -> Result<Value, ContractError> {
    match function {
        "get-telescope" => {
            args.expect_len(1)?;
            Ok(registry
                .telescope(args.uint(0)?)
                .map_or(Value::Null, telescope_value))
        }
        "get-telescope-data" => {
            args.expect_len(2)?;
            Ok(registry
                .data_at(args.uint(0)?, args.uint(1)?)
                .map_or(Value::Null, |d| json!({ "data": d.data })))
        }
        "get-telescope-count" => {
            args.expect_len(0)?;
            Ok(json!(registry.telescope_count()))
        }
        other => Err(unknown(Contract::TelescopeIntegration, other)),
    }
}

fn telescope_value(t: &Telescope) -> Value {
    json!({
        "name": t.name,
        "location": t.location,
        "api_endpoint": t.api_endpoint,
    })
}

// ---------------------------------------------------------------------------
// xenolinguistic-protocol
// ---------------------------------------------------------------------------

fn execute_xenolinguistic_protocol(
    governance: &mut GovernanceState,
    caller: &Principal,
    function: &str,
    args: &Args<'_>,
    events: &mut Vec<ContractEvent>,
) -> Result<Value, ContractError> {
    match function {
        "create-protocol" => {
            args.expect_len(3)?;
            let id = governance.create_protocol(caller, args.text(0)?, args.text(1)?, args.text(2)?)?;
            events.push(ContractEvent::ProtocolCreated {
                id,
                creator: caller.clone(),
            });
            Ok(json!(id))
        }
        "update-protocol" => {
            args.expect_len(2)?;
            let id = args.uint(0)?;
            governance.update_protocol(caller, id, args.text(1)?)?;
            events.push(ContractEvent::ProtocolUpdated { id });
            Ok(Value::Bool(true))
        }
        "vote-protocol" => {
            args.expect_len(1)?;
            let id = args.uint(0)?;
            let votes = governance.vote(caller, id)?;
            events.push(ContractEvent::ProtocolVoted {
                id,
                voter: caller.clone(),
                votes,
            });
            Ok(Value::Bool(true))
        }
        "set-protocol-status" => {
            args.expect_len(2)?;
            let id = args.uint(0)?;
            let status: ProtocolStatus = args.text(1)?.parse()?;
            governance.set_status(caller, id, status)?;
            events.push(ContractEvent::ProtocolStatusChanged { id, status });
            Ok(Value::Bool(true))
        }
        _ => read_xenolinguistic_protocol(governance, function, args),
    }
}

fn read_xenolinguistic_protocol(
    governance: &GovernanceState,
    function: &str,
    args: &Args<'_>,
) -> Result<Value, ContractError> {
    match function {
        "get-protocol" => {
            args.expect_len(1)?;
            Ok(governance
                .protocol(args.uint(0)?)
                .map_or(Value::Null, protocol_value))
        }
        "get-contributor" => {
            args.expect_len(2)?;
            let id = args.uint(0)?;
            Ok(args
                .lookup_principal(1)?
                .and_then(|principal| governance.contributor(id, &principal))
                .map_or(Value::Null, |c| json!({ "contributed": c.contributed })))
        }
        "get-protocol-count" => {
            args.expect_len(0)?;
            Ok(json!(governance.protocol_count()))
        }
        other => Err(unknown(Contract::XenolinguisticProtocol, other)),
    }
}

fn protocol_value(p: &Protocol) -> Value {
    json!({
        "creator": p.creator.as_str(),
        "name": p.name,
        "description": p.description,
        "content": p.content,
        "status": p.status.as_str(),
        "votes": p.votes,
    })
}
