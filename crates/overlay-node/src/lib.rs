//! overlay-node: the validator node as seen by the overlay reconciler.
//!
//! # Components
//!
//! - **`console`**: [`ControlInterface`] capability (list/add/delete
//!   custom overlays) and [`ValidatorConsole`], which drives the node's
//!   console binary one command at a time
//! - **`response`**: parsing of console text responses
//! - **`election`**: [`ElectionSource`] for current/next validator sets
//! - **`lite_client`**: [`LiteClientElectionSource`], validator sets read
//!   from config params 34/36 through the lite client
//! - **`memory`**: [`InMemoryConsole`], a recording stand-in for the node

pub mod console;
pub mod election;
pub mod error;
pub mod lite_client;
pub mod memory;
pub mod response;

pub use console::{ConsoleConfig, ControlInterface, ValidatorConsole};
pub use election::{ElectionSnapshot, ElectionSource, SnapshotElectionSource};
pub use error::{NodeError, NodeResult};
pub use lite_client::{LiteClientConfig, LiteClientElectionSource};
pub use memory::{ConsoleOp, InMemoryConsole};
