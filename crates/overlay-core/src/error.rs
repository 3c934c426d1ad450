//! Errors raised while loading, validating, or transcoding overlay configs.

use std::path::PathBuf;

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("overlay {overlay} uses @validators but no validator set was supplied")]
    MissingValidatorSet { overlay: String },

    #[error("@validators must be true when present")]
    DisabledWildcard,

    #[error("invalid member {key}: {reason}")]
    InvalidMember { key: String, reason: String },

    #[error("invalid adnl address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid overlay name {0:?}")]
    InvalidName(String),

    #[error("overlay config must be a JSON object")]
    NotAnObject,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed overlay config: {0}")]
    Json(#[from] serde_json::Error),
}
