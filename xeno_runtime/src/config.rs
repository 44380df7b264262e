//! Runtime configuration — JSON file with the session root, snapshot
//! cadence and the genesis used for new sessions.
//!
//! ```json
//! {
//!   "base_dir": "/var/lib/xeno",
//!   "snapshot_interval": 100,
//!   "genesis": { "owner": "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use xeno_kernel::domain::GenesisConfig;

use crate::error::RuntimeError;

/// Default number of calls between automatic snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 100;

fn default_snapshot_interval() -> u64 {
    DEFAULT_SNAPSHOT_INTERVAL
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub base_dir: PathBuf,
    /// 0 disables automatic snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    pub genesis: GenesisConfig,
}

impl RuntimeConfig {
    pub fn new(base_dir: impl Into<PathBuf>, genesis: GenesisConfig) -> Self {
        Self {
            base_dir: base_dir.into(),
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            genesis,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        serde_json::from_str(json).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_strictness() {
        let cfg = RuntimeConfig::from_json(
            r#"{"base_dir":"/tmp/xeno","genesis":{"owner":"ST1OWNER"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);
        assert_eq!(cfg.genesis.owner.as_str(), "ST1OWNER");

        assert!(matches!(
            RuntimeConfig::from_json(r#"{"base_dir":"/tmp","genesis":{"owner":"bad owner"}}"#),
            Err(RuntimeError::Config(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_json(r#"{"base_dir":"/tmp","genesis":{"owner":"ST1"},"x":1}"#),
            Err(RuntimeError::Config(_))
        ));
    }
}
