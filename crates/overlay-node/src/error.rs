//! Errors talking to the validator node or reading election data.

use std::path::PathBuf;

use thiserror::Error;

pub type NodeResult<T> = Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    /// The node build predates custom overlays.
    #[error("node does not support `{command}`")]
    Unsupported { command: String },

    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("console output is not valid UTF-8")]
    NonUtf8(#[from] std::string::FromUtf8Error),

    #[error("`{command}` failed: {output}")]
    CommandFailed { command: String, output: String },

    #[error("failed to write overlay descriptor {path}: {reason}")]
    WriteDescriptor { path: PathBuf, reason: String },

    #[error("failed to load election snapshot {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },

    #[error("config param {param}: {reason}")]
    ConfigParam { param: u32, reason: String },

    #[error("invalid response pattern: {0}")]
    Pattern(#[from] regex::Error),
}
