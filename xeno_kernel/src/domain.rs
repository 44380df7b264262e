/// Xeno kernel — Core Domain Types
///
/// Pure data. Contract behaviour lives in ledger.rs, registry.rs and
/// governance.rs. Every map is a BTreeMap so iteration order (and thus
/// the canonical hash) is deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

/// Upper bound on a token URI, in bytes.
pub const MAX_TOKEN_URI_LEN: u64 = 256;

/// Default upper bound on one telescope data payload, in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 4096;

// ── Principal ──────────────────────────────────────────────────────

/// Opaque actor identity, e.g. `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM`
/// or a contract principal `ST1PQ....xenotoken`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub const MAX_LEN: usize = 128;

    /// Validate that `raw` matches `[A-Za-z0-9._-]{1,128}`.
    pub fn parse(raw: &str) -> Result<Self, ContractError> {
        let well_formed = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'));
        if !well_formed {
            return Err(ContractError::InvalidPrincipal(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

// ── Ledger ─────────────────────────────────────────────────────────

/// Fungible balance ledger backing the xenotoken contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerState {
    pub owner: Principal,
    pub token_uri: String,
    pub total_supply: u64,
    pub balances: BTreeMap<Principal, u64>,
}

// ── Registry ───────────────────────────────────────────────────────

/// A registered telescope. The id is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Telescope {
    pub name: String,
    pub location: String,
    pub api_endpoint: String,
}

/// One raw data payload recorded at a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelescopeData {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryState {
    pub last_telescope_id: u64,
    pub telescopes: BTreeMap<u64, Telescope>,
    /// telescope_id → (timestamp → payload)
    pub data: BTreeMap<u64, BTreeMap<u64, TelescopeData>>,
    pub max_payload_bytes: u64,
}

// ── Governance ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolStatus {
    Active,
    Closed,
    Rejected,
}

impl ProtocolStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProtocolStatus::Active => "active",
            ProtocolStatus::Closed => "closed",
            ProtocolStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ProtocolStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProtocolStatus::Active),
            "closed" => Ok(ProtocolStatus::Closed),
            "rejected" => Ok(ProtocolStatus::Rejected),
            other => Err(ContractError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Protocol {
    pub creator: Principal,
    pub name: String,
    pub description: String,
    pub content: String,
    pub status: ProtocolStatus,
    pub votes: u64,
}

/// Per-(protocol, principal) vote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contributor {
    pub contributed: bool,
}

/// Who may call `update-protocol`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdatePolicy {
    #[default]
    CreatorOnly,
    AnyCaller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GovernanceState {
    pub last_protocol_id: u64,
    pub protocols: BTreeMap<u64, Protocol>,
    /// protocol_id → (principal → record)
    pub contributors: BTreeMap<u64, BTreeMap<Principal, Contributor>>,
    pub update_policy: UpdatePolicy,
}

// ── Chain ──────────────────────────────────────────────────────────

/// Complete state of all three contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainState {
    pub ledger: LedgerState,
    pub registry: RegistryState,
    pub governance: GovernanceState,
}

/// Deployment parameters, fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenesisConfig {
    pub owner: Principal,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
    #[serde(default)]
    pub update_policy: UpdatePolicy,
}

fn default_max_payload_bytes() -> u64 {
    DEFAULT_MAX_PAYLOAD_BYTES
}

impl GenesisConfig {
    /// Genesis with `owner` and every other field at its default.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            token_uri: String::new(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            update_policy: UpdatePolicy::default(),
        }
    }
}
