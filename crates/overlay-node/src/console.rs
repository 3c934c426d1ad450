//! Validator console control interface.
//!
//! The node exposes custom overlays through its console:
//!
//! ```text
//! showcustomoverlays           → one `Overlay "<name>" ...` line per overlay
//! addcustomoverlay <path>      → reads a node-list descriptor from <path>
//! delcustomoverlay <name>
//! ```
//!
//! [`ValidatorConsole`] runs the console binary once per command and blocks
//! until it exits. Commands are never pipelined.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_core::NodeListDescriptor;

use crate::error::{NodeError, NodeResult};
use crate::response;

pub const SHOW_COMMAND: &str = "showcustomoverlays";
pub const ADD_COMMAND: &str = "addcustomoverlay";
pub const DELETE_COMMAND: &str = "delcustomoverlay";

/// The node operations the reconciler needs.
pub trait ControlInterface {
    /// Names of the overlays currently deployed on the node.
    ///
    /// Returns [`NodeError::Unsupported`] when the node build has no custom
    /// overlay support.
    fn list(&self) -> NodeResult<Vec<String>>;

    /// Deploy an overlay instance described by `descriptor`.
    fn add(&self, descriptor: &NodeListDescriptor) -> NodeResult<()>;

    /// Remove the overlay instance `name` from the node.
    fn delete(&self, name: &str) -> NodeResult<()>;
}

/// How to reach the node's console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Console executable.
    pub binary: PathBuf,
    /// Client private key (`-k`).
    pub client_key: PathBuf,
    /// Server public key (`-p`).
    pub server_pub: PathBuf,
    /// Control address of the node (`-a`), `ip:port`.
    pub address: String,
    /// Where descriptors are written before `addcustomoverlay`.
    pub temp_dir: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("validator-engine-console"),
            client_key: PathBuf::from("/var/ton-work/keys/client"),
            server_pub: PathBuf::from("/var/ton-work/keys/server.pub"),
            address: "127.0.0.1:4441".to_string(),
            temp_dir: std::env::temp_dir().join("overlayd"),
        }
    }
}

/// [`ControlInterface`] backed by the validator console binary.
#[derive(Debug, Clone)]
pub struct ValidatorConsole {
    config: ConsoleConfig,
}

impl ValidatorConsole {
    pub fn new(config: ConsoleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Run one console command and return its combined output.
    ///
    /// A non-zero exit is an error unless the node reported the command as
    /// unknown; callers decide what an unknown command means.
    pub fn run(&self, command: &str) -> NodeResult<String> {
        debug!(%command, "running console command");
        let output = Command::new(&self.config.binary)
            .arg("-k")
            .arg(&self.config.client_key)
            .arg("-p")
            .arg(&self.config.server_pub)
            .arg("-a")
            .arg(&self.config.address)
            .args(["-v", "0", "--cmd", command])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| NodeError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;

        let mut text = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            text.push('\n');
            text.push_str(stderr.trim_end());
        }

        if !output.status.success() && !response::is_unknown_command(&text) {
            return Err(NodeError::CommandFailed {
                command: command.to_string(),
                output: text,
            });
        }
        Ok(text)
    }

    /// Run a mutating command and require the success token in the reply.
    fn run_checked(&self, command: &str) -> NodeResult<()> {
        let reply = self.run(command)?;
        if response::is_success(&reply) {
            Ok(())
        } else {
            Err(NodeError::CommandFailed {
                command: command.to_string(),
                output: reply,
            })
        }
    }

    fn descriptor_path(&self, name: &str) -> PathBuf {
        self.config.temp_dir.join(format!("custom_overlay_{name}.json"))
    }
}

impl ControlInterface for ValidatorConsole {
    fn list(&self) -> NodeResult<Vec<String>> {
        let reply = self.run(SHOW_COMMAND)?;
        if response::is_unknown_command(&reply) {
            return Err(NodeError::Unsupported {
                command: SHOW_COMMAND.to_string(),
            });
        }
        response::parse_overlay_list(&reply)
    }

    fn add(&self, descriptor: &NodeListDescriptor) -> NodeResult<()> {
        let path = self.descriptor_path(&descriptor.name);
        let write_err = |reason: String| NodeError::WriteDescriptor {
            path: path.clone(),
            reason,
        };
        let body = serde_json::to_vec(descriptor).map_err(|e| write_err(e.to_string()))?;
        std::fs::create_dir_all(&self.config.temp_dir).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(&path, body).map_err(|e| write_err(e.to_string()))?;

        self.run_checked(&format!("{ADD_COMMAND} {}", path.display()))
    }

    fn delete(&self, name: &str) -> NodeResult<()> {
        self.run_checked(&format!("{DELETE_COMMAND} {name}"))
    }
}
