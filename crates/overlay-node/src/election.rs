//! Election timing and validator sets.
//!
//! The reconciler needs the start time and validator ADNL addresses of the
//! current election and, once published, the next one. In the network config
//! these are the current (`p34`) and next (`p36`) validator-set parameters.
//! [`SnapshotElectionSource`] reads them from a JSON snapshot kept fresh by
//! whatever tooling already talks to the lite server (see
//! [`crate::lite_client`] for querying it directly):
//!
//! ```json
//! {
//!     "current": { "startWorkTime": 1700000000, "validators": [{ "adnlAddr": "…" }] },
//!     "next": null
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_core::ElectionEpochs;

use crate::error::{NodeError, NodeResult};

/// Anything that can report the live election epochs.
pub trait ElectionSource {
    fn epochs(&self) -> NodeResult<ElectionEpochs>;
}

/// Fixed epochs, for tests and one-off runs.
impl ElectionSource for ElectionEpochs {
    fn epochs(&self) -> NodeResult<ElectionEpochs> {
        Ok(self.clone())
    }
}

impl<T: ElectionSource + ?Sized> ElectionSource for Box<T> {
    fn epochs(&self) -> NodeResult<ElectionEpochs> {
        (**self).epochs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDescr {
    #[serde(rename = "adnlAddr")]
    pub adnl_addr: String,
}

/// Validator-set parameter as published in the network config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetParams {
    #[serde(rename = "startWorkTime")]
    pub start_work_time: u64,
    #[serde(default)]
    pub validators: Vec<ValidatorDescr>,
}

impl ValidatorSetParams {
    fn adnl_addrs(&self) -> Vec<String> {
        self.validators.iter().map(|v| v.adnl_addr.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSnapshot {
    pub current: ValidatorSetParams,
    #[serde(default)]
    pub next: Option<ValidatorSetParams>,
}

impl From<ElectionSnapshot> for ElectionEpochs {
    fn from(snapshot: ElectionSnapshot) -> Self {
        // A next set without validators has not been elected yet.
        let next = snapshot.next.filter(|n| !n.validators.is_empty());
        ElectionEpochs {
            current_election_id: snapshot.current.start_work_time,
            current_validator_set: snapshot.current.adnl_addrs(),
            next_election_id: next.as_ref().map_or(0, |n| n.start_work_time),
            next_validator_set: next.as_ref().map(ValidatorSetParams::adnl_addrs).unwrap_or_default(),
        }
    }
}

/// Reads epochs from a JSON snapshot file on every call.
#[derive(Debug, Clone)]
pub struct SnapshotElectionSource {
    path: PathBuf,
}

impl SnapshotElectionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ElectionSource for SnapshotElectionSource {
    fn epochs(&self) -> NodeResult<ElectionEpochs> {
        let snapshot_err = |reason: String| NodeError::Snapshot {
            path: self.path.clone(),
            reason,
        };
        let content = std::fs::read_to_string(&self.path).map_err(|e| snapshot_err(e.to_string()))?;
        let snapshot: ElectionSnapshot =
            serde_json::from_str(&content).map_err(|e| snapshot_err(e.to_string()))?;
        let epochs = ElectionEpochs::from(snapshot);
        debug!(
            current = epochs.current_election_id,
            next = epochs.next_election_id,
            validators = epochs.current_validator_set.len(),
            "election snapshot loaded"
        );
        Ok(epochs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(dir: &Path, json: &str) -> SnapshotElectionSource {
        let path = dir.join("elections.json");
        std::fs::write(&path, json).unwrap();
        SnapshotElectionSource::new(path)
    }

    #[test]
    fn reads_current_and_next() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_snapshot(
            dir.path(),
            r#"{
                "current": {"startWorkTime": 100, "validators": [{"adnlAddr": "aa"}, {"adnlAddr": "bb"}]},
                "next": {"startWorkTime": 200, "validators": [{"adnlAddr": "cc"}]}
            }"#,
        );

        let epochs = source.epochs().unwrap();
        assert_eq!(epochs.current_election_id, 100);
        assert_eq!(epochs.current_validator_set, vec!["aa", "bb"]);
        assert_eq!(epochs.next_election_id, 200);
        assert_eq!(epochs.next_validator_set, vec!["cc"]);
    }

    #[test]
    fn missing_or_empty_next_means_no_next_election() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_snapshot(
            dir.path(),
            r#"{"current": {"startWorkTime": 100, "validators": [{"adnlAddr": "aa"}]}}"#,
        );
        let epochs = source.epochs().unwrap();
        assert_eq!(epochs.next_election_id, 0);
        assert!(!epochs.has_next());

        let source = write_snapshot(
            dir.path(),
            r#"{"current": {"startWorkTime": 100, "validators": []}, "next": {"startWorkTime": 200, "validators": []}}"#,
        );
        let epochs = source.epochs().unwrap();
        assert_eq!(epochs.next_election_id, 0);
        assert!(epochs.next_validator_set.is_empty());
    }

    #[test]
    fn unreadable_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SnapshotElectionSource::new(dir.path().join("absent.json"));
        assert!(matches!(missing.epochs(), Err(NodeError::Snapshot { .. })));

        let garbled = write_snapshot(dir.path(), "{not json");
        assert!(matches!(garbled.epochs(), Err(NodeError::Snapshot { .. })));
    }

    #[test]
    fn fixed_epochs_are_a_source() {
        let epochs = ElectionEpochs {
            current_election_id: 5,
            ..Default::default()
        };
        assert_eq!(epochs.epochs().unwrap(), epochs);
    }
}
