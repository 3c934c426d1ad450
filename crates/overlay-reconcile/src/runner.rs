//! Periodic reconcile loop.
//!
//! Each pass runs on the blocking pool under a timeout. A pass that times out
//! keeps running in the background; until it finishes, later passes are
//! refused with [`ReconcileError::Busy`] so the node only ever sees one
//! command stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use overlay_node::{ControlInterface, ElectionSource};
use overlay_state::OverlayStore;

use crate::error::{ReconcileError, ReconcileResult};
use crate::reconciler::{ReconcileStats, Reconciler};

/// Clears the busy flag when the pass ends, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReconcileLoop<S, C, E> {
    reconciler: Arc<Reconciler<S, C, E>>,
    interval: Duration,
    timeout: Duration,
    running: Arc<AtomicBool>,
}

impl<S, C, E> ReconcileLoop<S, C, E>
where
    S: OverlayStore + Send + Sync + 'static,
    C: ControlInterface + Send + Sync + 'static,
    E: ElectionSource + Send + Sync + 'static,
{
    pub fn new(reconciler: Reconciler<S, C, E>, interval: Duration, timeout: Duration) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            interval,
            timeout,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S, C, E> {
        &self.reconciler
    }

    /// Run a single pass, bounded by the configured timeout.
    pub async fn run_once(&self) -> ReconcileResult<ReconcileStats> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ReconcileError::Busy);
        }

        let reconciler = self.reconciler.clone();
        let guard = RunningGuard(self.running.clone());
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            reconciler.reconcile()
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ReconcileError::Task(join_err.to_string())),
            Err(_) => Err(ReconcileError::TimedOut(self.timeout)),
        }
    }

    /// Reconcile immediately, then every `interval` until `shutdown` fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "custom overlay reconciler started"
        );

        loop {
            match self.run_once().await {
                Ok(stats) => debug!(?stats, "reconcile pass finished"),
                Err(ReconcileError::Busy) => {
                    warn!("previous reconcile pass still running, skipping this one")
                }
                Err(e) => error!(error = %e, "custom overlay reconcile failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => {
                    info!("custom overlay reconciler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{ElectionEpochs, NodeListDescriptor, OverlayConfig};
    use overlay_node::{InMemoryConsole, NodeResult};
    use overlay_state::StateStore;

    fn epochs() -> ElectionEpochs {
        ElectionEpochs {
            current_election_id: 100,
            current_validator_set: vec![
                "a100000000000000000000000000000000000000000000000000000000000001".to_string(),
            ],
            ..Default::default()
        }
    }

    fn store_with_committee() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put("committee", &OverlayConfig::new().with_validators())
            .unwrap();
        store
    }

    #[tokio::test]
    async fn run_once_reconciles() {
        let reconciler = Reconciler::new(store_with_committee(), InMemoryConsole::new(), epochs());
        let lp = ReconcileLoop::new(reconciler, Duration::from_secs(60), Duration::from_secs(5));

        let stats = lp.run_once().await.unwrap();

        assert_eq!(stats.added, 1);
        assert_eq!(lp.reconciler().console().overlays(), vec!["committee_elid100"]);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let reconciler = Reconciler::new(store_with_committee(), InMemoryConsole::new(), epochs());
        let lp = ReconcileLoop::new(reconciler, Duration::from_millis(10), Duration::from_secs(5));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            lp.run(shutdown_rx).await;
            lp
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();
        let lp = handle.await.unwrap();

        // Several passes ran; only the first one changed anything.
        let ops = lp.reconciler().console().ops();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name(), "committee_elid100");
    }

    /// Node whose listing blocks for a while.
    struct SlowNode(Duration);

    impl ControlInterface for SlowNode {
        fn list(&self) -> NodeResult<Vec<String>> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }

        fn add(&self, _: &NodeListDescriptor) -> NodeResult<()> {
            Ok(())
        }

        fn delete(&self, _: &str) -> NodeResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn timed_out_pass_blocks_the_next_until_it_finishes() {
        let reconciler = Reconciler::new(
            StateStore::open_in_memory().unwrap(),
            SlowNode(Duration::from_millis(300)),
            epochs(),
        );
        let lp = ReconcileLoop::new(reconciler, Duration::from_secs(60), Duration::from_millis(50));

        assert!(matches!(lp.run_once().await, Err(ReconcileError::TimedOut(_))));
        assert!(matches!(lp.run_once().await, Err(ReconcileError::Busy)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        let lp = ReconcileLoop {
            timeout: Duration::from_secs(5),
            ..lp
        };
        assert!(lp.run_once().await.is_ok());
    }

    /// Node whose listing blocks, then panics.
    struct PanickingNode(Duration);

    impl ControlInterface for PanickingNode {
        fn list(&self) -> NodeResult<Vec<String>> {
            std::thread::sleep(self.0);
            panic!("console crashed");
        }

        fn add(&self, _: &NodeListDescriptor) -> NodeResult<()> {
            Ok(())
        }

        fn delete(&self, _: &str) -> NodeResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn panic_after_timeout_releases_the_loop() {
        let reconciler = Reconciler::new(
            StateStore::open_in_memory().unwrap(),
            PanickingNode(Duration::from_millis(150)),
            epochs(),
        );
        let lp = ReconcileLoop::new(reconciler, Duration::from_secs(60), Duration::from_millis(50));

        assert!(matches!(lp.run_once().await, Err(ReconcileError::TimedOut(_))));

        tokio::time::sleep(Duration::from_millis(500)).await;
        let lp = ReconcileLoop {
            timeout: Duration::from_secs(5),
            ..lp
        };
        // The next pass runs (and panics again) instead of reporting Busy.
        assert!(matches!(lp.run_once().await, Err(ReconcileError::Task(_))));
        assert!(!lp.running.load(Ordering::Acquire));
    }
}
