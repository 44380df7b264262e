/// Xeno kernel — Invariant Checks
///
/// Hard-fail validation run on every candidate state before it is
/// committed, and on every snapshot before it is restored. Returns the
/// first violation found.

use thiserror::Error;

use crate::domain::{ChainState, GovernanceState, LedgerState, RegistryState, MAX_TOKEN_URI_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violation: [INVARIANT:{rule}] {detail}")]
pub struct InvariantViolation {
    pub rule: &'static str,
    pub detail: String,
}

fn violation(rule: &'static str, detail: String) -> InvariantViolation {
    InvariantViolation { rule, detail }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn validate_invariants(state: &ChainState) -> Result<(), InvariantViolation> {
    check_supply_conservation(&state.ledger)?;
    check_token_uri_bound(&state.ledger)?;
    check_telescope_ids(&state.registry)?;
    check_data_refs(&state.registry)?;
    check_protocol_ids(&state.governance)?;
    check_contributor_refs(&state.governance)?;
    check_votes_match_contributors(&state.governance)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Sum of all balances equals total supply.
fn check_supply_conservation(ledger: &LedgerState) -> Result<(), InvariantViolation> {
    let sum: u128 = ledger.balances.values().map(|&b| u128::from(b)).sum();
    if sum != u128::from(ledger.total_supply) {
        return Err(violation(
            "supply_conservation",
            format!(
                "balances sum to {} but total supply is {}",
                sum, ledger.total_supply
            ),
        ));
    }
    Ok(())
}

fn check_token_uri_bound(ledger: &LedgerState) -> Result<(), InvariantViolation> {
    if ledger.token_uri.len() as u64 > MAX_TOKEN_URI_LEN {
        return Err(violation(
            "token_uri_bound",
            format!("token uri is {} bytes", ledger.token_uri.len()),
        ));
    }
    Ok(())
}

/// Every telescope id lies in 1..=last_telescope_id.
fn check_telescope_ids(registry: &RegistryState) -> Result<(), InvariantViolation> {
    for &id in registry.telescopes.keys() {
        if id == 0 || id > registry.last_telescope_id {
            return Err(violation(
                "telescope_ids",
                format!(
                    "telescope id {} outside 1..={}",
                    id, registry.last_telescope_id
                ),
            ));
        }
    }
    Ok(())
}

/// Data is only recorded against registered telescopes, within the
/// payload bound.
fn check_data_refs(registry: &RegistryState) -> Result<(), InvariantViolation> {
    for (id, log) in &registry.data {
        if !registry.telescopes.contains_key(id) {
            return Err(violation(
                "data_refs",
                format!("data recorded for unknown telescope {}", id),
            ));
        }
        for (ts, entry) in log {
            if entry.data.len() as u64 > registry.max_payload_bytes {
                return Err(violation(
                    "data_refs",
                    format!(
                        "payload at ({}, {}) is {} bytes, bound is {}",
                        id,
                        ts,
                        entry.data.len(),
                        registry.max_payload_bytes
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn check_protocol_ids(governance: &GovernanceState) -> Result<(), InvariantViolation> {
    for &id in governance.protocols.keys() {
        if id == 0 || id > governance.last_protocol_id {
            return Err(violation(
                "protocol_ids",
                format!(
                    "protocol id {} outside 1..={}",
                    id, governance.last_protocol_id
                ),
            ));
        }
    }
    Ok(())
}

fn check_contributor_refs(governance: &GovernanceState) -> Result<(), InvariantViolation> {
    for id in governance.contributors.keys() {
        if !governance.protocols.contains_key(id) {
            return Err(violation(
                "contributor_refs",
                format!("contributor records for unknown protocol {}", id),
            ));
        }
    }
    Ok(())
}

/// votes == number of distinct principals that contributed.
fn check_votes_match_contributors(governance: &GovernanceState) -> Result<(), InvariantViolation> {
    for (id, protocol) in &governance.protocols {
        let voters = governance
            .contributors
            .get(id)
            .map_or(0, |records| records.values().filter(|c| c.contributed).count())
            as u64;
        if voters != protocol.votes {
            return Err(violation(
                "votes_match_contributors",
                format!(
                    "protocol {} counts {} votes but has {} contributors",
                    id, protocol.votes, voters
                ),
            ));
        }
    }
    Ok(())
}
