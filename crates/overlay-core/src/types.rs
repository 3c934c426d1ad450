//! Election epochs and the node-list descriptor handed to the node.

use serde::{Deserialize, Serialize};

/// Start time (unix seconds) of an election round.
pub type ElectionId = u64;

/// Validator-set timing for the live elections.
///
/// `next_election_id == 0` means no next election is scheduled yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionEpochs {
    pub current_election_id: ElectionId,
    /// Hex ADNL addresses, in validator-set order.
    pub current_validator_set: Vec<String>,
    pub next_election_id: ElectionId,
    pub next_validator_set: Vec<String>,
}

impl ElectionEpochs {
    pub fn has_next(&self) -> bool {
        self.next_election_id != 0
    }

    /// Whether an instance scoped to `election_id` should still exist.
    pub fn is_live(&self, election_id: ElectionId) -> bool {
        election_id == self.current_election_id || election_id == self.next_election_id
    }
}

/// Overlay definition in the shape `addcustomoverlay` reads from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeListDescriptor {
    /// Instance name, possibly epoch-suffixed.
    pub name: String,
    pub nodes: Vec<NodeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Base64-encoded ADNL address.
    pub adnl_id: String,
    pub msg_sender: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_sender_priority: Option<i64>,
}
