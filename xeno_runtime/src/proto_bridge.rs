//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between the call log's protobuf envelope and the kernel's
//! `CallEnvelope` (JSON argument values). Only scalar arguments have a
//! wire form; floats, arrays and objects are refused rather than
//! silently coerced.

use serde_json::Value;
use thiserror::Error;

use xeno_kernel::call::CallEnvelope;
use xeno_kernel::domain::Principal;
use xeno_kernel::error::ContractError;

use crate::proto_types::{ArgKind, Nothing, ProtoArg, ProtoCallEnvelope};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("argument {index} of call {sequence} has no wire form: {kind}")]
    UnsupportedArg {
        sequence: u64,
        index: usize,
        kind: &'static str,
    },

    #[error("argument {index} of call {sequence} is empty")]
    EmptyArg { sequence: u64, index: usize },

    #[error("call {sequence} has an invalid caller: {source}")]
    Caller {
        sequence: u64,
        source: ContractError,
    },
}

/// Convert a kernel envelope to its wire form.
pub fn kernel_to_proto(call: &CallEnvelope) -> Result<ProtoCallEnvelope, BridgeError> {
    let args = call
        .args
        .iter()
        .enumerate()
        .map(|(index, v)| value_to_arg(call.sequence, index, v))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProtoCallEnvelope {
        sequence: call.sequence,
        block_time: call.block_time,
        caller: call.caller.to_string(),
        contract: call.contract.clone(),
        function: call.function.clone(),
        args,
        schema_version: call.schema_version,
    })
}

/// Convert a wire envelope back to the kernel's form.
pub fn proto_to_kernel(proto: &ProtoCallEnvelope) -> Result<CallEnvelope, BridgeError> {
    let caller = Principal::parse(&proto.caller).map_err(|source| BridgeError::Caller {
        sequence: proto.sequence,
        source,
    })?;
    let args = proto
        .args
        .iter()
        .enumerate()
        .map(|(index, a)| arg_to_value(proto.sequence, index, a))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CallEnvelope {
        sequence: proto.sequence,
        block_time: proto.block_time,
        caller,
        contract: proto.contract.clone(),
        function: proto.function.clone(),
        args,
        schema_version: proto.schema_version,
    })
}

fn value_to_arg(sequence: u64, index: usize, v: &Value) -> Result<ProtoArg, BridgeError> {
    let unsupported = |kind| BridgeError::UnsupportedArg {
        sequence,
        index,
        kind,
    };
    let kind = match v {
        Value::Null => ArgKind::Nothing(Nothing {}),
        Value::Bool(b) => ArgKind::Flag(*b),
        Value::String(s) => ArgKind::Text(s.clone()),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                ArgKind::Uint(u)
            } else if let Some(i) = n.as_i64() {
                ArgKind::Int(i)
            } else {
                return Err(unsupported("float"));
            }
        }
        Value::Array(_) => return Err(unsupported("array")),
        Value::Object(_) => return Err(unsupported("object")),
    };
    Ok(ProtoArg { kind: Some(kind) })
}

fn arg_to_value(sequence: u64, index: usize, arg: &ProtoArg) -> Result<Value, BridgeError> {
    match &arg.kind {
        Some(ArgKind::Uint(u)) => Ok(Value::from(*u)),
        Some(ArgKind::Int(i)) => Ok(Value::from(*i)),
        Some(ArgKind::Text(s)) => Ok(Value::from(s.as_str())),
        Some(ArgKind::Flag(b)) => Ok(Value::Bool(*b)),
        Some(ArgKind::Nothing(_)) => Ok(Value::Null),
        None => Err(BridgeError::EmptyArg { sequence, index }),
    }
}
