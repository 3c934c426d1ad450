//! Errors that abort a whole reconcile pass.
//!
//! Per-instance failures never surface here; they are counted in
//! `ReconcileStats::failed` and logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("node error: {0}")]
    Node(#[from] overlay_node::NodeError),

    #[error("overlay store error: {0}")]
    State(#[from] overlay_state::StateError),

    #[error("previous reconcile pass is still running")]
    Busy,

    #[error("reconcile pass timed out after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("reconcile task failed: {0}")]
    Task(String),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
