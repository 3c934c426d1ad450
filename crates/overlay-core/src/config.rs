//! Declared custom overlay configs.
//!
//! A config body is a JSON object whose keys are either ADNL addresses (hex)
//! or the `@validators` wildcard:
//!
//! ```json
//! {
//!     "@validators": true,
//!     "0f3c…a1": { "msg_sender": true, "msg_sender_priority": 5 }
//! }
//! ```
//!
//! Key order is significant: transcoding emits nodes in the order the
//! operator wrote them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// Member key that expands to every validator of an election.
pub const VALIDATORS_WILDCARD: &str = "@validators";

/// Per-member flags for an enumerated overlay member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub msg_sender: bool,
    /// Only meaningful when `msg_sender` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_sender_priority: Option<i64>,
}

impl MemberSpec {
    pub fn receiver() -> Self {
        Self {
            msg_sender: false,
            msg_sender_priority: None,
        }
    }

    pub fn sender(priority: i64) -> Self {
        Self {
            msg_sender: true,
            msg_sender_priority: Some(priority),
        }
    }
}

/// One entry of a declared overlay body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// `"@validators": true`
    Validators,
    /// An enumerated node, keyed by its hex ADNL address.
    Node { adnl: String, spec: MemberSpec },
}

impl Member {
    fn key(&self) -> &str {
        match self {
            Member::Validators => VALIDATORS_WILDCARD,
            Member::Node { adnl, .. } => adnl,
        }
    }
}

/// Body of a declared custom overlay. The name lives beside it in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct OverlayConfig {
    members: Vec<Member>,
}

impl OverlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config body from a JSON string.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Load a config body from a JSON file on disk.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add the `@validators` wildcard.
    pub fn with_validators(self) -> Self {
        self.with_member(Member::Validators)
    }

    /// Add (or replace) an enumerated member.
    pub fn with_node(self, adnl: &str, spec: MemberSpec) -> Self {
        self.with_member(Member::Node {
            adnl: adnl.to_string(),
            spec,
        })
    }

    fn with_member(mut self, member: Member) -> Self {
        match self.members.iter_mut().find(|m| m.key() == member.key()) {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
        self
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// True when the body contains the wildcard, i.e. instances of this
    /// overlay are scoped to an election.
    pub fn has_validators_wildcard(&self) -> bool {
        self.members.iter().any(|m| matches!(m, Member::Validators))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for OverlayConfig {
    type Error = ConfigError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut members = Vec::with_capacity(map.len());
        for (key, value) in map {
            if key == VALIDATORS_WILDCARD {
                match value {
                    Value::Bool(true) => members.push(Member::Validators),
                    Value::Bool(false) => return Err(ConfigError::DisabledWildcard),
                    other => {
                        return Err(ConfigError::InvalidMember {
                            key,
                            reason: format!("expected true, got {other}"),
                        });
                    }
                }
                continue;
            }

            hex::decode(&key).map_err(|e| ConfigError::InvalidAddress {
                address: key.clone(),
                reason: e.to_string(),
            })?;

            let spec: MemberSpec =
                serde_json::from_value(value).map_err(|e| ConfigError::InvalidMember {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
            if spec.msg_sender && spec.msg_sender_priority.is_none() {
                return Err(ConfigError::InvalidMember {
                    key,
                    reason: "msg_sender_priority is required when msg_sender is true".to_string(),
                });
            }
            members.push(Member::Node { adnl: key, spec });
        }
        Ok(Self { members })
    }
}

impl TryFrom<Value> for OverlayConfig {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Self::try_from(map),
            _ => Err(ConfigError::NotAnObject),
        }
    }
}

impl From<OverlayConfig> for Map<String, Value> {
    fn from(config: OverlayConfig) -> Self {
        let mut map = Map::new();
        for member in config.members {
            match member {
                Member::Validators => {
                    map.insert(VALIDATORS_WILDCARD.to_string(), Value::Bool(true));
                }
                Member::Node { adnl, spec } => {
                    let mut body = Map::new();
                    body.insert("msg_sender".to_string(), Value::Bool(spec.msg_sender));
                    if let Some(priority) = spec.msg_sender_priority {
                        body.insert("msg_sender_priority".to_string(), priority.into());
                    }
                    map.insert(adnl, Value::Object(body));
                }
            }
        }
        map
    }
}

/// Overlay names are embedded in console commands, quoted console output,
/// and temp file names.
pub fn validate_overlay_name(name: &str) -> ConfigResult<()> {
    let bad_char = |c: char| c.is_whitespace() || matches!(c, '"' | '/' | '\\');
    if name.is_empty() || name.chars().any(bad_char) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}
