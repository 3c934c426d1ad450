//! overlay-reconcile: drives a validator node's custom overlays towards the
//! declared configs.
//!
//! # Algorithm
//!
//! ```text
//! names    = node.list()                  (unsupported build → no-op)
//! epochs   = elections.epochs()
//! declared = store.get_all()
//!
//! for name in names:                      prune
//!     base, elid = decode(name)
//!     if elid and elid ∉ {current, next}: delete(name); continue
//!     if base ∉ declared:                 delete(name)
//!
//! for name, config in declared:           create
//!     if name ∈ names: continue
//!     if config has @validators:
//!         add name_elid{current} with current validators   (if missing)
//!         add name_elid{next}    with next validators      (if next != 0, missing)
//!     else:
//!         add name
//! ```
//!
//! Every add/delete failure is logged and skipped; the next pass retries.
//!
//! # Components
//!
//! - **`reconciler`**: one synchronous pass, [`Reconciler::reconcile`]
//! - **`runner`**: periodic passes on a tokio interval with a per-pass timeout

pub mod error;
pub mod reconciler;
pub mod runner;

pub use error::{ReconcileError, ReconcileResult};
pub use reconciler::{ReconcileStats, Reconciler};
pub use runner::ReconcileLoop;
