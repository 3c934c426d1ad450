//! One-shot and periodic reconcile against the local validator node.

use std::io::Write;

use tokio::sync::watch;
use tracing::{info, warn};

use overlay_node::{
    ConsoleOp, ControlInterface, ElectionSource, InMemoryConsole, LiteClientElectionSource,
    NodeError, SnapshotElectionSource, ValidatorConsole,
};
use overlay_reconcile::{ReconcileLoop, ReconcileStats, Reconciler};
use overlay_state::{FileStore, OverlayStore};

use crate::config::{DaemonConfig, ElectionConfig, ElectionSourceKind};

/// Open the declared-overlay store. The database file is only locked while
/// an operation runs, so a running daemon does not block operator commands.
pub fn open_store(config: &DaemonConfig) -> anyhow::Result<FileStore> {
    std::fs::create_dir_all(&config.store.data_dir)?;
    let db_path = config.store.db_path();
    let store = FileStore::open(&db_path)?;
    info!(path = ?db_path, "overlay store opened");
    Ok(store)
}

pub fn election_source(config: &ElectionConfig) -> Box<dyn ElectionSource + Send + Sync> {
    match config.source {
        ElectionSourceKind::LiteClient => {
            Box::new(LiteClientElectionSource::new(config.lite_client.clone()))
        }
        ElectionSourceKind::Snapshot => Box::new(SnapshotElectionSource::new(config.snapshot.clone())),
    }
}

/// Run a single reconcile pass. With `dry_run` the node is only listed and
/// the commands that would be sent are printed instead.
pub fn deploy(config: &DaemonConfig, dry_run: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let console = ValidatorConsole::new(config.console.clone());
    let elections = election_source(&config.election);

    if dry_run {
        let (stats, ops) = plan(store, &console, elections)?;
        write_plan(out, &ops)?;
        write_stats(out, &stats)?;
    } else {
        let stats = Reconciler::new(store, console, elections).reconcile()?;
        write_stats(out, &stats)?;
    }
    Ok(())
}

/// Reconcile against an in-memory copy of `node`'s overlay list and return
/// the commands that would have been sent. `node` is only listed.
pub fn plan<S, C, E>(
    store: S,
    node: &C,
    elections: E,
) -> anyhow::Result<(ReconcileStats, Vec<ConsoleOp>)>
where
    S: OverlayStore,
    C: ControlInterface,
    E: ElectionSource,
{
    let mirror = match node.list() {
        Ok(names) => InMemoryConsole::new().with_overlays(names),
        Err(NodeError::Unsupported { .. }) => InMemoryConsole::new().unsupported(),
        Err(e) => return Err(e.into()),
    };

    let reconciler = Reconciler::new(store, mirror, elections);
    let stats = reconciler.reconcile()?;
    Ok((stats, reconciler.console().ops()))
}

pub fn write_plan(out: &mut impl Write, ops: &[ConsoleOp]) -> anyhow::Result<()> {
    if ops.is_empty() {
        writeln!(out, "Nothing to do")?;
    }
    for op in ops {
        match op {
            ConsoleOp::Add(descriptor) => {
                writeln!(out, "+ {} ({} nodes)", descriptor.name, descriptor.nodes.len())?
            }
            ConsoleOp::Delete(name) => writeln!(out, "- {name}")?,
        }
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, stats: &ReconcileStats) -> anyhow::Result<()> {
    if stats.unsupported {
        writeln!(out, "Node does not support custom overlays")?;
        return Ok(());
    }
    writeln!(
        out,
        "observed {}, added {}, deleted {}, failed {}, skipped {}",
        stats.observed, stats.added, stats.deleted, stats.failed, stats.skipped
    )?;
    Ok(())
}

/// Reconcile every `reconcile.interval_secs` until Ctrl-C.
pub async fn run(config: &DaemonConfig) -> anyhow::Result<()> {
    info!("overlay daemon starting");

    let store = open_store(config)?;
    let console = ValidatorConsole::new(config.console.clone());
    let elections = election_source(&config.election);
    info!(
        address = %config.console.address,
        election_source = ?config.election.source,
        "validator console configured"
    );

    let reconcile_loop = ReconcileLoop::new(
        Reconciler::new(store, console, elections),
        config.reconcile.interval(),
        config.reconcile.timeout(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C, stopping"),
        }
        let _ = shutdown_tx.send(true);
    });

    reconcile_loop.run(shutdown_rx).await;

    info!("overlay daemon stopped");
    Ok(())
}
