//! Session manager — isolated sessions with persist-before-commit semantics.
//!
//! Each session owns a directory:
//!   <base_dir>/<session_id>/genesis.json
//!   <base_dir>/<session_id>/calls.log
//!   <base_dir>/<session_id>/snapshots/
//!
//! Submit order:
//!   1. apply the call to a clone of the engine (refusals stop here)
//!   2. append the call to the log
//!   3. commit the clone
//!   4. snapshot if the interval is reached
//!
//! Concurrency: `SharedSession` serializes access with a Mutex. No global
//! mutable state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::{info, warn};

use xeno_kernel::call::{CallEnvelope, CallReceipt};
use xeno_kernel::domain::{ChainState, GenesisConfig, Principal};
use xeno_kernel::engine::Engine;
use xeno_kernel::error::ContractError;

use crate::call_log::CallLog;
use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::proto_bridge::{kernel_to_proto, proto_to_kernel};
use crate::replay;
use crate::snapshot;

const GENESIS_FILE: &str = "genesis.json";
const CALL_LOG_FILE: &str = "calls.log";
const SNAPSHOT_DIR: &str = "snapshots";

/// An isolated chain session with its own call log and state.
pub struct Session {
    session_id: String,
    session_dir: PathBuf,
    genesis: GenesisConfig,
    engine: Engine,
    call_log: CallLog,
    snapshot_interval: u64,
    clock: Arc<dyn Clock>,
}

impl Session {
    /// Open or create the session `session_id` under `config.base_dir`.
    ///
    /// A new session persists `config.genesis`; an existing one keeps the
    /// genesis it was created with. State is restored from the newest
    /// valid snapshot and the rest of the log is replayed on top.
    pub fn open(
        config: &RuntimeConfig,
        session_id: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RuntimeError> {
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RuntimeError::SessionId(session_id.to_string()));
        }

        let session_dir = config.base_dir.join(session_id);
        fs::create_dir_all(&session_dir)?;
        let genesis = load_or_init_genesis(&session_dir, &config.genesis)?;

        let call_log = CallLog::open(&session_dir.join(CALL_LOG_FILE))?;
        let mut engine = match restore_from_snapshots(&session_dir.join(SNAPSHOT_DIR), &call_log)? {
            Some(engine) => engine,
            None => Engine::new(&genesis)?,
        };

        let from = engine.last_sequence();
        let tail = call_log.load_after(from)?;
        for proto in &tail {
            let call = proto_to_kernel(proto)?;
            engine.apply_call(&call)?;
        }

        info!(
            session = session_id,
            restored_from = from,
            replayed = tail.len(),
            sequence = engine.last_sequence(),
            "session opened"
        );

        Ok(Self {
            session_id: session_id.to_string(),
            session_dir,
            genesis,
            engine,
            call_log,
            snapshot_interval: config.snapshot_interval,
            clock,
        })
    }

    /// Include a fully formed call. The call is persisted before the state
    /// is committed; a refused envelope touches neither.
    pub fn submit(&mut self, call: &CallEnvelope) -> Result<CallReceipt, RuntimeError> {
        let proto = kernel_to_proto(call)?;

        let mut next = self.engine.clone();
        let receipt = next.apply_call(call)?;

        self.call_log.append(&proto)?;
        self.engine = next;

        if self.snapshot_interval > 0 && call.sequence % self.snapshot_interval == 0 {
            if let Err(err) = self.snapshot() {
                warn!(session = %self.session_id, sequence = call.sequence, error = %err, "auto-snapshot failed");
            }
        }

        Ok(receipt)
    }

    /// Invoke `contract.function(args)` as `caller`. The host stamps the
    /// next sequence and the clock time, clamped so block time never
    /// goes backwards.
    pub fn invoke(
        &mut self,
        caller: &str,
        contract: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<CallReceipt, RuntimeError> {
        let caller = Principal::parse(caller).map_err(RuntimeError::Caller)?;
        let block_time = self.clock.now()?.max(self.engine.last_block_time());
        let call = CallEnvelope::new(
            self.engine.next_sequence(),
            block_time,
            caller,
            contract,
            function,
            args,
        );
        self.submit(&call)
    }

    /// Read-only call against committed state. Consumes no sequence.
    pub fn query(&self, contract: &str, function: &str, args: &[Value]) -> Result<Value, ContractError> {
        self.engine.query(contract, function, args)
    }

    /// Write a snapshot of the current state.
    pub fn snapshot(&self) -> Result<PathBuf, RuntimeError> {
        let path = snapshot::save_snapshot(
            &self.session_dir.join(SNAPSHOT_DIR),
            self.engine.last_sequence(),
            self.engine.last_block_time(),
            self.engine.state(),
        )?;
        info!(session = %self.session_id, sequence = self.engine.last_sequence(), "snapshot saved");
        Ok(path)
    }

    /// Discard in-memory state and rebuild it from genesis and the full log.
    pub fn replay_full(&mut self) -> Result<(ChainState, String), RuntimeError> {
        let calls = self
            .call_log
            .load_all()?
            .iter()
            .map(proto_to_kernel)
            .collect::<Result<Vec<_>, _>>()?;

        let (engine, _) = replay::replay(&self.genesis, &calls)?;
        self.engine = engine;
        Ok((self.engine.state().clone(), self.engine.state_hash()))
    }

    pub fn state(&self) -> &ChainState {
        self.engine.state()
    }

    pub fn current_hash(&self) -> String {
        self.engine.state_hash()
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn last_block_time(&self) -> u64 {
        self.engine.last_block_time()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }
}

fn load_or_init_genesis(session_dir: &Path, fallback: &GenesisConfig) -> Result<GenesisConfig, RuntimeError> {
    let path = session_dir.join(GENESIS_FILE);
    if path.exists() {
        let content = fs::read_to_string(&path)?;
        let stored: GenesisConfig = serde_json::from_str(&content)
            .map_err(|e| RuntimeError::Config(format!("{}: {}", path.display(), e)))?;
        if &stored != fallback {
            warn!(path = %path.display(), "session genesis differs from config; keeping stored genesis");
        }
        return Ok(stored);
    }

    let content = serde_json::to_string_pretty(fallback).map_err(|e| RuntimeError::Config(e.to_string()))?;
    fs::write(&path, content)?;
    Ok(fallback.clone())
}

/// Newest snapshot that verifies and is not ahead of the log.
fn restore_from_snapshots(dir: &Path, call_log: &CallLog) -> Result<Option<Engine>, RuntimeError> {
    for seq in snapshot::list_snapshots(dir)? {
        if seq > call_log.last_sequence() {
            warn!(sequence = seq, log_sequence = call_log.last_sequence(), "snapshot ahead of call log, skipping");
            continue;
        }
        let restored = snapshot::load_snapshot(dir, seq)
            .and_then(|snap| snap.map(|s| snapshot::restore_engine(&s)).transpose());
        match restored {
            Ok(Some(engine)) => return Ok(Some(engine)),
            Ok(None) => {}
            Err(err) => warn!(sequence = seq, error = %err, "unusable snapshot, skipping"),
        }
    }
    Ok(None)
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, RuntimeError> {
        self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)
    }

    pub fn submit(&self, call: &CallEnvelope) -> Result<CallReceipt, RuntimeError> {
        self.lock()?.submit(call)
    }

    pub fn invoke(
        &self,
        caller: &str,
        contract: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<CallReceipt, RuntimeError> {
        self.lock()?.invoke(caller, contract, function, args)
    }

    pub fn query(&self, contract: &str, function: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        self.lock()?
            .query(contract, function, args)
            .map_err(RuntimeError::Query)
    }

    pub fn current_hash(&self) -> Result<String, RuntimeError> {
        Ok(self.lock()?.current_hash())
    }

    pub fn current_sequence(&self) -> Result<u64, RuntimeError> {
        Ok(self.lock()?.current_sequence())
    }

    pub fn into_inner(self) -> Result<Session, RuntimeError> {
        self.inner.into_inner().map_err(|_| RuntimeError::LockPoisoned)
    }
}
