//! Integration tests for xeno_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use xeno_kernel::call::CallEnvelope;
use xeno_kernel::domain::{GenesisConfig, Principal};
use xeno_kernel::error::{ContractError, EngineError};

use xeno_runtime::call_log::CallLog;
use xeno_runtime::clock::{Clock, ManualClock};
use xeno_runtime::config::RuntimeConfig;
use xeno_runtime::drift::{compare_states, verify_determinism};
use xeno_runtime::proto_bridge::{kernel_to_proto, proto_to_kernel};
use xeno_runtime::replay;
use xeno_runtime::session::{Session, SharedSession};
use xeno_runtime::snapshot;
use xeno_runtime::RuntimeError;

const OWNER: &str = "ST1OWNER";
const ALICE: &str = "ST1ALICE";
const BOB: &str = "ST1BOB";

fn principal(raw: &str) -> Principal {
    Principal::parse(raw).unwrap()
}

fn genesis() -> GenesisConfig {
    GenesisConfig::new(principal(OWNER))
}

fn config(dir: &tempfile::TempDir, snapshot_interval: u64) -> RuntimeConfig {
    let mut cfg = RuntimeConfig::new(dir.path(), genesis());
    cfg.snapshot_interval = snapshot_interval;
    cfg
}

fn clock(start: u64) -> (ManualClock, Arc<dyn Clock>) {
    let clock = ManualClock::new(start);
    (clock.clone(), Arc::new(clock))
}

/// A mixed workload touching all three contracts, including failures.
fn workload() -> Vec<CallEnvelope> {
    let rows: Vec<(&str, &str, &str, Vec<Value>)> = vec![
        (OWNER, "xenotoken", "mint", vec![json!(1000), json!(ALICE)]),
        (ALICE, "xenotoken", "transfer", vec![json!(250), json!(ALICE), json!(BOB)]),
        (BOB, "xenotoken", "mint", vec![json!(5), json!(BOB)]),
        (OWNER, "xenotoken", "reward-breakthrough", vec![json!(BOB), json!(75)]),
        (ALICE, "telescope-integration", "register-telescope", vec![json!("SETI ATA"), json!("Hat Creek"), json!("https://ata.example/api")]),
        (ALICE, "telescope-integration", "submit-telescope-data", vec![json!(1), json!("0101")]),
        (ALICE, "telescope-integration", "submit-telescope-data", vec![json!(9), json!("ffff")]),
        (BOB, "xenolinguistic-protocol", "create-protocol", vec![json!("Universal Greeting Protocol"), json!("prime sequence"), json!("2 3 5 7")]),
        (ALICE, "xenolinguistic-protocol", "vote-protocol", vec![json!(1)]),
        (ALICE, "xenolinguistic-protocol", "vote-protocol", vec![json!(1)]),
        (OWNER, "xenolinguistic-protocol", "vote-protocol", vec![json!(1)]),
        (BOB, "xenolinguistic-protocol", "update-protocol", vec![json!(1), json!("2 3 5 7 11")]),
    ];
    rows.into_iter()
        .zip(1u64..)
        .map(|((caller, contract, function, args), seq)| {
            CallEnvelope::new(seq, 1_700_000_000 + seq * 10, principal(caller), contract, function, args)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────
// Log and replay
// ─────────────────────────────────────────────────────────────

#[test]
fn append_and_replay_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let calls = workload();
    let log_path = dir.path().join("calls.log");
    {
        let mut log = CallLog::open(&log_path).expect("open log");
        for call in &calls {
            log.append(&kernel_to_proto(call).unwrap()).expect("append");
        }
    }

    let log = CallLog::open(&log_path).expect("reopen log");
    let loaded: Vec<CallEnvelope> = log
        .load_all()
        .unwrap()
        .iter()
        .map(|p| proto_to_kernel(p).unwrap())
        .collect();
    assert_eq!(loaded, calls);

    let hash_log = replay::rebuild_hash(&genesis(), &loaded).unwrap();
    let hash_direct = verify_determinism(&genesis(), &calls).unwrap();
    assert_eq!(hash_log, hash_direct);
}

#[test]
fn corrupted_log_detection() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("calls.log");
    {
        let mut log = CallLog::open(&log_path).unwrap();
        for call in &workload()[..5] {
            log.append(&kernel_to_proto(call).unwrap()).unwrap();
        }
    }

    let data = fs::read(&log_path).unwrap();
    fs::write(&log_path, &data[..data.len() - 3]).unwrap();

    // Either open fails, or load_all fails
    match CallLog::open(&log_path) {
        Ok(log) => assert!(log.load_all().is_err()),
        Err(err) => assert_eq!(err.kind(), std::io::ErrorKind::InvalidData),
    }
}

#[test]
fn corrupted_session_log_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 0);
    let (_, clk) = clock(100);
    {
        let mut session = Session::open(&cfg, "alpha", clk.clone()).unwrap();
        session.invoke(OWNER, "xenotoken", "mint", vec![json!(10), json!(ALICE)]).unwrap();
    }
    let log_path = dir.path().join("alpha").join("calls.log");
    let mut data = fs::read(&log_path).unwrap();
    data.extend_from_slice(&[7, 0, 0, 0, 1]);
    fs::write(&log_path, data).unwrap();

    assert!(matches!(Session::open(&cfg, "alpha", clk), Err(RuntimeError::Io(_))));
}

// ─────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn session_reopen_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 0);
    let (_, clk) = clock(1_700_000_000);

    let hash = {
        let mut session = Session::open(&cfg, "alpha", clk.clone()).unwrap();
        for call in &workload() {
            session.submit(call).unwrap();
        }
        session.current_hash()
    };

    let mut session = Session::open(&cfg, "alpha", clk).unwrap();
    assert_eq!(session.current_sequence(), workload().len() as u64);
    assert_eq!(session.current_hash(), hash);
    assert_eq!(session.query("xenotoken", "get-balance", &[json!(BOB)]).unwrap(), json!(325));

    let (_, replayed) = session.replay_full().unwrap();
    assert_eq!(replayed, hash);
    assert!(dir.path().join("alpha").join("genesis.json").exists());
}

#[test]
fn stored_genesis_wins_over_config() {
    let dir = tempfile::tempdir().unwrap();
    let (_, clk) = clock(0);
    {
        let cfg = config(&dir, 0);
        Session::open(&cfg, "alpha", clk.clone()).unwrap();
    }
    let mut other = config(&dir, 0);
    other.genesis = GenesisConfig::new(principal(BOB));
    let mut session = Session::open(&other, "alpha", clk).unwrap();

    assert_eq!(session.genesis().owner.as_str(), OWNER);
    let receipt = session.invoke(BOB, "xenotoken", "mint", vec![json!(1), json!(BOB)]).unwrap();
    assert_eq!(receipt.error(), Some(&ContractError::Unauthorized));
}

#[test]
fn concurrent_sessions_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 0);
    let (_, clk) = clock(0);
    let calls = workload();

    let mut session_a = Session::open(&cfg, "session_a", clk.clone()).unwrap();
    let mut session_b = Session::open(&cfg, "session_b", clk).unwrap();

    for call in &calls {
        session_a.submit(call).unwrap();
    }
    for call in &calls[..4] {
        session_b.submit(call).unwrap();
    }

    assert_ne!(session_a.current_hash(), session_b.current_hash());
    assert_eq!(session_a.current_sequence(), calls.len() as u64);
    assert_eq!(session_b.current_sequence(), 4);
    assert_eq!(session_a.current_hash(), replay::rebuild_hash(&genesis(), &calls).unwrap());
}

#[test]
fn refused_envelope_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 0);
    let (_, clk) = clock(0);
    let calls = workload();
    let mut session = Session::open(&cfg, "alpha", clk.clone()).unwrap();
    session.submit(&calls[0]).unwrap();

    let mut bad = calls[1].clone();
    bad.schema_version = 99;
    assert!(matches!(
        session.submit(&bad),
        Err(RuntimeError::Engine(EngineError::SchemaVersion { expected: 1, got: 99 }))
    ));
    assert!(matches!(
        session.submit(&calls[2]),
        Err(RuntimeError::Engine(EngineError::Sequence { expected: 2, got: 3 }))
    ));

    let mut float_arg = calls[1].clone();
    float_arg.args[0] = json!(1.5);
    assert!(matches!(session.submit(&float_arg), Err(RuntimeError::Bridge(_))));

    assert_eq!(session.current_sequence(), 1);
    drop(session);
    let reopened = Session::open(&cfg, "alpha", clk).unwrap();
    assert_eq!(reopened.current_sequence(), 1);
}

#[test]
fn invalid_session_id_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, clk) = clock(0);
    for id in ["", "../escape", "a/b"] {
        assert!(matches!(
            Session::open(&config(&dir, 0), id, clk.clone()),
            Err(RuntimeError::SessionId(_))
        ));
    }
}

// ─────────────────────────────────────────────────────────────
// Host clock
// ─────────────────────────────────────────────────────────────

#[test]
fn telescope_data_uses_host_clock() {
    let dir = tempfile::tempdir().unwrap();
    let (manual, clk) = clock(1_234_567_890);
    let mut session = Session::open(&config(&dir, 0), "obs", clk).unwrap();

    session
        .invoke(ALICE, "telescope-integration", "register-telescope", vec![json!("Arecibo"), json!("PR"), json!("https://arecibo.example")])
        .unwrap();
    let receipt = session
        .invoke(ALICE, "telescope-integration", "submit-telescope-data", vec![json!(1), json!("wow")])
        .unwrap();
    assert_eq!(receipt.value(), Some(&json!(true)));
    assert_eq!(
        session.query("telescope-integration", "get-telescope-data", &[json!(1), json!(1_234_567_890)]).unwrap(),
        json!({"data": "wow"})
    );

    // A clock that jumps backwards is clamped to the last block time.
    manual.set(5);
    session
        .invoke(ALICE, "telescope-integration", "submit-telescope-data", vec![json!(1), json!("again")])
        .unwrap();
    assert_eq!(session.last_block_time(), 1_234_567_890);
    assert_eq!(
        session.query("telescope-integration", "get-telescope-data", &[json!(1), json!(1_234_567_890)]).unwrap(),
        json!({"data": "again"})
    );

    manual.advance(2_000_000_000);
    session
        .invoke(ALICE, "telescope-integration", "submit-telescope-data", vec![json!(1), json!("later")])
        .unwrap();
    assert_eq!(session.last_block_time(), 2_000_000_005);
}

#[test]
fn invoke_rejects_bad_caller() {
    let dir = tempfile::tempdir().unwrap();
    let (_, clk) = clock(0);
    let mut session = Session::open(&config(&dir, 0), "alpha", clk).unwrap();
    assert!(matches!(
        session.invoke("not a principal", "xenotoken", "get-token-uri", vec![]),
        Err(RuntimeError::Caller(ContractError::InvalidPrincipal(_)))
    ));
    assert_eq!(session.current_sequence(), 0);
}

// ─────────────────────────────────────────────────────────────
// Snapshots
// ─────────────────────────────────────────────────────────────

#[test]
fn snapshot_restore_matches_full_replay() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 5);
    let (_, clk) = clock(0);
    let calls = workload();

    let hash = {
        let mut session = Session::open(&cfg, "alpha", clk.clone()).unwrap();
        for call in &calls {
            session.submit(call).unwrap();
        }
        session.current_hash()
    };

    let snap_dir = dir.path().join("alpha").join("snapshots");
    assert_eq!(snapshot::list_snapshots(&snap_dir).unwrap(), vec![10, 5]);

    let latest = snapshot::load_latest_snapshot(&snap_dir).unwrap().unwrap();
    assert!(snapshot::verify_snapshot_hash(&latest));
    assert_eq!(latest.state_hash, replay::rebuild_hash(&genesis(), &calls[..10]).unwrap());

    let mut session = Session::open(&cfg, "alpha", clk).unwrap();
    assert_eq!(session.current_hash(), hash);
    let (_, replayed) = session.replay_full().unwrap();
    assert_eq!(replayed, hash);
}

#[test]
fn corrupt_snapshot_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir, 5);
    let (_, clk) = clock(0);
    let calls = workload();

    let hash = {
        let mut session = Session::open(&cfg, "alpha", clk.clone()).unwrap();
        for call in &calls {
            session.submit(call).unwrap();
        }
        session.current_hash()
    };

    let snap_dir = dir.path().join("alpha").join("snapshots");
    fs::write(snap_dir.join("snapshot_000010.json"), "{ not json").unwrap();
    // Ahead of the log: must be ignored.
    fs::copy(snap_dir.join("snapshot_000005.json"), snap_dir.join("snapshot_000099.json")).unwrap();

    let session = Session::open(&cfg, "alpha", clk).unwrap();
    assert_eq!(session.current_hash(), hash);
    assert_eq!(session.current_sequence(), calls.len() as u64);
}

// ─────────────────────────────────────────────────────────────
// Shared sessions
// ─────────────────────────────────────────────────────────────

#[test]
fn shared_session_serializes_threads() {
    let dir = tempfile::tempdir().unwrap();
    let (_, clk) = clock(0);
    let cfg = config(&dir, 0);
    let shared = Arc::new(SharedSession::new(Session::open(&cfg, "shared", clk.clone()).unwrap()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..5 {
                    let receipt = shared
                        .invoke(OWNER, "xenotoken", "mint", vec![json!(1), json!(ALICE)])
                        .unwrap();
                    assert!(receipt.is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shared.current_sequence().unwrap(), 20);
    assert_eq!(shared.query("xenotoken", "get-total-supply", &[]).unwrap(), json!(20));
    let hash = shared.current_hash().unwrap();

    let session = Arc::try_unwrap(shared).ok().unwrap().into_inner().unwrap();
    drop(session);
    let reopened = Session::open(&cfg, "shared", clk).unwrap();
    assert_eq!(reopened.current_hash(), hash);
}

// ─────────────────────────────────────────────────────────────
// Drift
// ─────────────────────────────────────────────────────────────

#[test]
fn drift_between_replay_points() {
    let calls = workload();
    let (early, _) = replay::rebuild_state(&genesis(), &calls[..7]).unwrap();
    let (late, _) = replay::rebuild_state(&genesis(), &calls).unwrap();

    let report = compare_states(&early, &late);
    assert_eq!(report.total_supply_delta, 0);
    assert_eq!(report.added_protocols, vec![1]);
    assert!(report.vote_changes.is_empty());
    assert!(report.added_telescopes.is_empty());
    assert!(!report.is_empty());
    assert!(compare_states(&late, &late).is_empty());
}
