/// Xeno kernel — Call Definitions
///
/// Calls are pure data: which contract, which function, ordered
/// arguments, plus the host-supplied context (caller, block time,
/// sequence). They contain ZERO contract logic.
///
/// Schema version is locked at 1. Envelopes with any other version are
/// refused by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Principal, ProtocolStatus};
use crate::error::ContractError;

/// Schema version for v1 call envelopes.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// The three deployed contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    Xenotoken,
    TelescopeIntegration,
    XenolinguisticProtocol,
}

impl Contract {
    pub const ALL: [Contract; 3] = [
        Contract::Xenotoken,
        Contract::TelescopeIntegration,
        Contract::XenolinguisticProtocol,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Contract::Xenotoken => "xenotoken",
            Contract::TelescopeIntegration => "telescope-integration",
            Contract::XenolinguisticProtocol => "xenolinguistic-protocol",
        }
    }

    /// Resolve a deployed name or its component alias
    /// (`ledger` | `registry` | `governance`).
    pub fn resolve(name: &str) -> Result<Self, ContractError> {
        match name {
            "xenotoken" | "ledger" => Ok(Contract::Xenotoken),
            "telescope-integration" | "registry" => Ok(Contract::TelescopeIntegration),
            "xenolinguistic-protocol" | "governance" => Ok(Contract::XenolinguisticProtocol),
            other => Err(ContractError::UnknownContract(other.to_string())),
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One call as submitted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallEnvelope {
    pub sequence: u64,
    /// Host clock at inclusion, seconds. Used as the telescope data
    /// timestamp.
    pub block_time: u64,
    pub caller: Principal,
    pub contract: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

impl CallEnvelope {
    pub fn new(
        sequence: u64,
        block_time: u64,
        caller: Principal,
        contract: impl Into<String>,
        function: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            sequence,
            block_time,
            caller,
            contract: contract.into(),
            function: function.into(),
            args,
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// Audit record emitted by a successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ContractEvent {
    Minted {
        recipient: Principal,
        amount: u64,
    },
    BreakthroughRewarded {
        recipient: Principal,
        amount: u64,
    },
    Transferred {
        sender: Principal,
        recipient: Principal,
        amount: u64,
    },
    TokenUriUpdated {
        uri: String,
    },
    TelescopeRegistered {
        id: u64,
        name: String,
    },
    TelescopeDataSubmitted {
        telescope_id: u64,
        timestamp: u64,
        replaced: bool,
    },
    ProtocolCreated {
        id: u64,
        creator: Principal,
    },
    ProtocolUpdated {
        id: u64,
    },
    ProtocolVoted {
        id: u64,
        voter: Principal,
        votes: u64,
    },
    ProtocolStatusChanged {
        id: u64,
        status: ProtocolStatus,
    },
}

/// Outcome of an included call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallReceipt {
    pub sequence: u64,
    pub contract: String,
    pub function: String,
    pub outcome: Result<Value, ContractError>,
    pub events: Vec<ContractEvent>,
}

impl CallReceipt {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ContractError> {
        self.outcome.as_ref().err()
    }
}
