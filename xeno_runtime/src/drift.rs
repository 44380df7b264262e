//! Drift detection — determinism verification and state comparison.
//!
//! All numeric values are integers. Deltas are i128 so any pair of u64
//! counters fits.

use std::collections::BTreeSet;

use serde::Serialize;

use xeno_kernel::call::CallEnvelope;
use xeno_kernel::domain::{ChainState, GenesisConfig, Principal, ProtocolStatus};

use crate::error::RuntimeError;
use crate::replay;

/// Replay the same calls twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism(genesis: &GenesisConfig, calls: &[CallEnvelope]) -> Result<String, RuntimeError> {
    let first = replay::rebuild_hash(genesis, calls)?;
    let second = replay::rebuild_hash(genesis, calls)?;

    if first != second {
        return Err(RuntimeError::Nondeterministic { first, second });
    }
    Ok(first)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceChange {
    pub account: Principal,
    pub before: u64,
    pub after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteChange {
    pub protocol_id: u64,
    pub before: u64,
    pub after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub protocol_id: u64,
    pub before: ProtocolStatus,
    pub after: ProtocolStatus,
}

/// Structured difference between two chain states (a → b).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub total_supply_a: u64,
    pub total_supply_b: u64,
    pub total_supply_delta: i128,
    pub balance_changes: Vec<BalanceChange>,
    pub telescope_count_a: u64,
    pub telescope_count_b: u64,
    pub added_telescopes: Vec<u64>,
    pub data_points_a: u64,
    pub data_points_b: u64,
    pub data_points_delta: i128,
    pub protocol_count_a: u64,
    pub protocol_count_b: u64,
    pub added_protocols: Vec<u64>,
    pub vote_changes: Vec<VoteChange>,
    pub status_changes: Vec<StatusChange>,
}

impl DriftReport {
    /// True when nothing observable differs.
    pub fn is_empty(&self) -> bool {
        self.total_supply_delta == 0
            && self.balance_changes.is_empty()
            && self.added_telescopes.is_empty()
            && self.data_points_delta == 0
            && self.added_protocols.is_empty()
            && self.vote_changes.is_empty()
            && self.status_changes.is_empty()
    }
}

fn delta(a: u64, b: u64) -> i128 {
    i128::from(b) - i128::from(a)
}

pub fn compare_states(state_a: &ChainState, state_b: &ChainState) -> DriftReport {
    let (ledger_a, ledger_b) = (&state_a.ledger, &state_b.ledger);
    let accounts: BTreeSet<&Principal> = ledger_a.balances.keys().chain(ledger_b.balances.keys()).collect();
    let balance_changes = accounts
        .into_iter()
        .filter_map(|account| {
            let before = ledger_a.balance_of(account);
            let after = ledger_b.balance_of(account);
            (before != after).then(|| BalanceChange {
                account: account.clone(),
                before,
                after,
            })
        })
        .collect();

    let (registry_a, registry_b) = (&state_a.registry, &state_b.registry);
    let added_telescopes = registry_b
        .telescopes
        .keys()
        .filter(|id| !registry_a.telescopes.contains_key(*id))
        .copied()
        .collect();
    let data_points_a = registry_a.data_point_count();
    let data_points_b = registry_b.data_point_count();

    // Vote and status changes in protocols present in both states
    let (gov_a, gov_b) = (&state_a.governance, &state_b.governance);
    let mut added_protocols = Vec::new();
    let mut vote_changes = Vec::new();
    let mut status_changes = Vec::new();
    for (&protocol_id, after) in &gov_b.protocols {
        let Some(before) = gov_a.protocols.get(&protocol_id) else {
            added_protocols.push(protocol_id);
            continue;
        };
        if before.votes != after.votes {
            vote_changes.push(VoteChange {
                protocol_id,
                before: before.votes,
                after: after.votes,
            });
        }
        if before.status != after.status {
            status_changes.push(StatusChange {
                protocol_id,
                before: before.status,
                after: after.status,
            });
        }
    }

    DriftReport {
        total_supply_a: ledger_a.total_supply,
        total_supply_b: ledger_b.total_supply,
        total_supply_delta: delta(ledger_a.total_supply, ledger_b.total_supply),
        balance_changes,
        telescope_count_a: registry_a.telescope_count(),
        telescope_count_b: registry_b.telescope_count(),
        added_telescopes,
        data_points_a,
        data_points_b,
        data_points_delta: delta(data_points_a, data_points_b),
        protocol_count_a: gov_a.protocol_count(),
        protocol_count_b: gov_b.protocol_count(),
        added_protocols,
        vote_changes,
        status_changes,
    }
}
