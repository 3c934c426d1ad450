//! overlayctl: operator commands and the reconcile daemon for validator
//! custom overlays.
//!
//! ```text
//! overlayctl add <name> <path>     declare an overlay from a JSON body
//! overlayctl list                  print declared overlays
//! overlayctl delete <name>         remove a declared overlay
//! overlayctl deploy [--dry-run]    one reconcile pass against the node
//! overlayctl run                   reconcile periodically until Ctrl-C
//! ```

pub mod commands;
pub mod config;

pub use config::DaemonConfig;
