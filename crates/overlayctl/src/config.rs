//! overlayd.toml configuration parser.
//!
//! ```toml
//! [store]
//! data_dir = "/var/lib/overlayd"
//!
//! [console]
//! binary = "/usr/bin/ton/validator-engine-console/validator-engine-console"
//! client_key = "/var/ton-work/keys/client"
//! server_pub = "/var/ton-work/keys/server.pub"
//! address = "127.0.0.1:4441"
//!
//! [election]
//! source = "lite-client"          # or "snapshot"
//! snapshot = "/var/lib/overlayd/elections.json"
//!
//! [election.lite_client]
//! binary = "/usr/bin/ton/lite-client/lite-client"
//! server_pub = "/var/ton-work/keys/liteserver.pub"
//! address = "127.0.0.1:4443"
//!
//! [reconcile]
//! interval_secs = 60
//! timeout_secs = 120
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use overlay_node::{ConsoleConfig, LiteClientConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub store: StoreConfig,
    pub console: ConsoleConfig,
    pub election: ElectionConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/overlayd"),
        }
    }
}

impl StoreConfig {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("overlays.redb")
    }
}

/// Where validator sets come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElectionSourceKind {
    /// Config params 34/36 through the lite client.
    #[default]
    LiteClient,
    /// A JSON snapshot file written by other tooling.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    pub source: ElectionSourceKind,
    /// JSON snapshot of the current and next validator sets.
    pub snapshot: PathBuf,
    pub lite_client: LiteClientConfig,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            source: ElectionSourceKind::default(),
            snapshot: PathBuf::from("/var/lib/overlayd/elections.json"),
            lite_client: LiteClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub interval_secs: u64,
    /// Upper bound for a single pass.
    pub timeout_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeout_secs: 120,
        }
    }
}

impl ReconcileConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Read `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
