//! Reconciler: one convergence pass over the node's custom overlays.
//!
//! Reads what the node has deployed, what operators declared, and which
//! elections are live, then deletes stale instances and adds missing ones.
//! Instances are never patched in place: a changed body only takes effect
//! once its instance is deleted and re-added.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use overlay_core::{
    decode_instance_name, encode_instance_name, transcode, ElectionEpochs, ElectionId,
    OverlayConfig,
};
use overlay_node::{ControlInterface, ElectionSource, NodeError};
use overlay_state::OverlayStore;

use crate::error::ReconcileResult;

/// Outcome counters for a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Instances reported by the node at the start of the pass.
    pub observed: u32,
    pub deleted: u32,
    pub added: u32,
    /// Adds or deletes the node refused, or configs that failed to transcode.
    pub failed: u32,
    /// Elections whose validator set was unavailable.
    pub skipped: u32,
    /// The node build has no custom overlay support; nothing was done.
    pub unsupported: bool,
}

impl ReconcileStats {
    /// Fresh counters for a pass that saw `instances` names, saturating at
    /// `u32::MAX`.
    fn observing(instances: usize) -> Self {
        Self {
            observed: u32::try_from(instances).unwrap_or(u32::MAX),
            ..Default::default()
        }
    }

    /// Number of add/delete commands that took effect.
    pub fn changes(&self) -> u32 {
        self.added.saturating_add(self.deleted)
    }
}

/// Converges the node's custom overlays with the declared configs.
pub struct Reconciler<S, C, E> {
    store: S,
    console: C,
    elections: E,
}

impl<S, C, E> Reconciler<S, C, E>
where
    S: OverlayStore,
    C: ControlInterface,
    E: ElectionSource,
{
    pub fn new(store: S, console: C, elections: E) -> Self {
        Self {
            store,
            console,
            elections,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Run one pass. Only failures to observe state (listing, election
    /// info, the store) abort the pass; add/delete failures are counted.
    pub fn reconcile(&self) -> ReconcileResult<ReconcileStats> {
        let names = match self.console.list() {
            Ok(names) => names,
            Err(NodeError::Unsupported { command }) => {
                info!(%command, "node has no custom overlay support, skipping");
                return Ok(ReconcileStats {
                    unsupported: true,
                    ..Default::default()
                });
            }
            Err(e) => return Err(e.into()),
        };
        let epochs = self.elections.epochs()?;
        let declared = self.store.get_all()?;

        let mut stats = ReconcileStats::observing(names.len());

        self.prune(&names, &epochs, &declared, &mut stats);
        self.create_missing(&names, &epochs, &declared, &mut stats);

        info!(
            observed = stats.observed,
            declared = declared.len(),
            added = stats.added,
            deleted = stats.deleted,
            failed = stats.failed,
            skipped = stats.skipped,
            current_election = epochs.current_election_id,
            next_election = epochs.next_election_id,
            "custom overlay reconcile complete"
        );
        Ok(stats)
    }

    /// Delete instances of finished elections and instances whose config
    /// was removed.
    fn prune(
        &self,
        names: &[String],
        epochs: &ElectionEpochs,
        declared: &BTreeMap<String, OverlayConfig>,
        stats: &mut ReconcileStats,
    ) {
        for name in names {
            let instance = decode_instance_name(name);

            if let Some(election_id) = instance.election_id {
                if !epochs.is_live(election_id) {
                    self.remove(name, "election finished", stats);
                    continue;
                }
            }

            if !declared.contains_key(instance.base) {
                self.remove(name, "config removed", stats);
            }
        }
    }

    /// Add instances for declared configs the node does not have yet.
    ///
    /// Presence is judged against the names listed at the start of the pass.
    fn create_missing(
        &self,
        names: &[String],
        epochs: &ElectionEpochs,
        declared: &BTreeMap<String, OverlayConfig>,
        stats: &mut ReconcileStats,
    ) {
        let present: HashSet<&str> = names.iter().map(String::as_str).collect();

        for (name, config) in declared {
            if present.contains(name.as_str()) {
                continue;
            }

            if !config.has_validators_wildcard() {
                self.deploy(name, config, None, stats);
                continue;
            }

            self.ensure_scoped(
                name,
                config,
                epochs.current_election_id,
                &epochs.current_validator_set,
                &present,
                stats,
            );
            if epochs.has_next() {
                self.ensure_scoped(
                    name,
                    config,
                    epochs.next_election_id,
                    &epochs.next_validator_set,
                    &present,
                    stats,
                );
            }
        }
    }

    fn ensure_scoped(
        &self,
        base: &str,
        config: &OverlayConfig,
        election_id: ElectionId,
        validators: &[String],
        present: &HashSet<&str>,
        stats: &mut ReconcileStats,
    ) {
        let instance = encode_instance_name(base, election_id);
        if present.contains(instance.as_str()) {
            debug!(overlay = %instance, "custom overlay already deployed");
            return;
        }
        if validators.is_empty() {
            warn!(
                overlay = %base,
                election_id,
                "no validator set for election, cannot expand @validators"
            );
            stats.skipped += 1;
            return;
        }
        self.deploy(&instance, config, Some(validators), stats);
    }

    fn deploy(
        &self,
        instance: &str,
        config: &OverlayConfig,
        validators: Option<&[String]>,
        stats: &mut ReconcileStats,
    ) {
        let descriptor = match transcode(instance, config, validators) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(overlay = %instance, error = %e, "cannot transcode custom overlay");
                stats.failed += 1;
                return;
            }
        };

        match self.console.add(&descriptor) {
            Ok(()) => {
                info!(overlay = %instance, nodes = descriptor.nodes.len(), "custom overlay added");
                stats.added += 1;
            }
            Err(e) => {
                warn!(overlay = %instance, error = %e, "failed to add custom overlay");
                stats.failed += 1;
            }
        }
    }

    fn remove(&self, name: &str, reason: &'static str, stats: &mut ReconcileStats) {
        match self.console.delete(name) {
            Ok(()) => {
                info!(overlay = %name, reason, "custom overlay deleted");
                stats.deleted += 1;
            }
            Err(e) => {
                warn!(overlay = %name, reason, error = %e, "failed to delete custom overlay");
                stats.failed += 1;
            }
        }
    }
}
