/// Xeno kernel — Scenario Harness
///
/// A scenario is a genesis plus an ordered list of calls with optional
/// expected outcomes, loaded from JSON:
///
/// ```json
/// [{ "name": "mint", "genesis": { "owner": "ST1OWNER" },
///    "calls": [{ "caller": "ST1OWNER", "contract": "xenotoken",
///                "function": "mint", "args": [1000, "ST1ALICE"],
///                "expect": { "ok": true } }] }]
/// ```
///
/// `expect.err` matches when the error message contains the given text.
/// Scenarios are run twice; differing final hashes mark the run as
/// non-deterministic.

use serde::Deserialize;
use serde_json::Value;

use crate::call::{CallEnvelope, CallReceipt};
use crate::domain::{GenesisConfig, Principal};
use crate::engine::Engine;
use crate::error::EngineError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub genesis: GenesisConfig,
    pub calls: Vec<ScenarioCall>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioCall {
    pub caller: Principal,
    pub contract: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Defaults to the previous call's block time (0 for the first call).
    #[serde(default)]
    pub block_time: Option<u64>,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    Ok(Value),
    Err(String),
}

impl Expectation {
    fn matches(&self, receipt: &CallReceipt) -> bool {
        match (self, &receipt.outcome) {
            (Expectation::Ok(expected), Ok(actual)) => expected == actual,
            (Expectation::Err(expected), Err(err)) => err.to_string().contains(expected.as_str()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub sequence: u64,
    pub function: String,
    pub expected: Expectation,
    pub actual: Result<Value, String>,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub receipts: Vec<CallReceipt>,
    pub mismatches: Vec<Mismatch>,
    pub state_hash: String,
    pub deterministic: bool,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.deterministic
    }
}

impl Scenario {
    /// Number each call and resolve its block time.
    pub fn envelopes(&self) -> Vec<CallEnvelope> {
        let mut block_time = 0;
        self.calls
            .iter()
            .zip(1u64..)
            .map(|(c, sequence)| {
                block_time = c.block_time.unwrap_or(block_time);
                CallEnvelope::new(
                    sequence,
                    block_time,
                    c.caller.clone(),
                    c.contract.as_str(),
                    c.function.as_str(),
                    c.args.clone(),
                )
            })
            .collect()
    }
}

pub fn parse_scenarios(json: &str) -> Result<Vec<Scenario>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Run a scenario twice and compare every receipt against its expectation.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport, EngineError> {
    let calls = scenario.envelopes();

    let mut engine = Engine::new(&scenario.genesis)?;
    let receipts = engine.apply_sequence(&calls)?;
    let state_hash = engine.state_hash();

    let mut rerun = Engine::new(&scenario.genesis)?;
    rerun.apply_sequence(&calls)?;
    let deterministic = rerun.state_hash() == state_hash;

    let mismatches = scenario
        .calls
        .iter()
        .zip(&receipts)
        .filter_map(|(call, receipt)| {
            let expected = call.expect.as_ref()?;
            if expected.matches(receipt) {
                return None;
            }
            Some(Mismatch {
                sequence: receipt.sequence,
                function: receipt.function.clone(),
                expected: expected.clone(),
                actual: receipt.outcome.clone().map_err(|e| e.to_string()),
            })
        })
        .collect();

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        receipts,
        mismatches,
        state_hash,
        deterministic,
    })
}
