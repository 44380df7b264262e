/// Xeno kernel — Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
///
/// Rules:
///   - kernel_version first, then ledger, registry, governance
///   - every map emitted in key order (BTreeMap order)
///   - struct fields in fixed order
///   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{ChainState, GovernanceState, LedgerState, RegistryState, UpdatePolicy};
use crate::KERNEL_VERSION;

/// Canonical serialization of ChainState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &ChainState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &ChainState) -> String {
    hex_digest(&canonical_serialize(state))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn build_canonical_value(state: &ChainState) -> Value {
    // kernel_version MUST be first (part of the kernel identity).
    let mut root = Map::new();
    root.insert("kernel_version".into(), Value::from(KERNEL_VERSION));
    root.insert("ledger".into(), ledger_value(&state.ledger));
    root.insert("registry".into(), registry_value(&state.registry));
    root.insert("governance".into(), governance_value(&state.governance));
    Value::Object(root)
}

fn ledger_value(ledger: &LedgerState) -> Value {
    let mut balances = Map::new();
    for (who, amount) in &ledger.balances {
        balances.insert(who.to_string(), Value::from(*amount));
    }

    let mut m = Map::new();
    m.insert("owner".into(), Value::from(ledger.owner.as_str()));
    m.insert("token_uri".into(), Value::from(ledger.token_uri.as_str()));
    m.insert("total_supply".into(), Value::from(ledger.total_supply));
    m.insert("balances".into(), Value::Object(balances));
    Value::Object(m)
}

fn registry_value(registry: &RegistryState) -> Value {
    let mut telescopes = Map::new();
    for (id, t) in &registry.telescopes {
        let mut tm = Map::new();
        tm.insert("name".into(), Value::from(t.name.as_str()));
        tm.insert("location".into(), Value::from(t.location.as_str()));
        tm.insert("api_endpoint".into(), Value::from(t.api_endpoint.as_str()));
        telescopes.insert(id.to_string(), Value::Object(tm));
    }

    // Ordered by numeric key, emitted as [key, value] pairs so the order
    // survives any JSON map implementation.
    let data: Vec<Value> = registry
        .data
        .iter()
        .flat_map(|(id, log)| {
            log.iter().map(move |(ts, entry)| {
                Value::Array(vec![
                    Value::from(*id),
                    Value::from(*ts),
                    Value::from(entry.data.as_str()),
                ])
            })
        })
        .collect();

    let mut m = Map::new();
    m.insert("last_telescope_id".into(), Value::from(registry.last_telescope_id));
    m.insert("max_payload_bytes".into(), Value::from(registry.max_payload_bytes));
    m.insert("telescopes".into(), Value::Object(telescopes));
    m.insert("data".into(), Value::Array(data));
    Value::Object(m)
}

fn governance_value(governance: &GovernanceState) -> Value {
    let mut protocols = Map::new();
    for (id, p) in &governance.protocols {
        let voters: Vec<Value> = governance
            .contributors
            .get(id)
            .into_iter()
            .flat_map(|records| records.iter())
            .filter(|(_, c)| c.contributed)
            .map(|(who, _)| Value::from(who.as_str()))
            .collect();

        let mut pm = Map::new();
        pm.insert("creator".into(), Value::from(p.creator.as_str()));
        pm.insert("name".into(), Value::from(p.name.as_str()));
        pm.insert("description".into(), Value::from(p.description.as_str()));
        pm.insert("content".into(), Value::from(p.content.as_str()));
        pm.insert("status".into(), Value::from(p.status.as_str()));
        pm.insert("votes".into(), Value::from(p.votes));
        pm.insert("voters".into(), Value::Array(voters));
        protocols.insert(id.to_string(), Value::Object(pm));
    }

    let policy = match governance.update_policy {
        UpdatePolicy::CreatorOnly => "creator-only",
        UpdatePolicy::AnyCaller => "any-caller",
    };

    let mut m = Map::new();
    m.insert("last_protocol_id".into(), Value::from(governance.last_protocol_id));
    m.insert("update_policy".into(), Value::from(policy));
    m.insert("protocols".into(), Value::Object(protocols));
    Value::Object(m)
}
