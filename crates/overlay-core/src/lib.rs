//! overlay-core: custom overlay model shared by the store, the node
//! collaborators, and the reconciler.
//!
//! - **`config`**: declared overlay bodies (`@validators` wildcard or
//!   enumerated ADNL members) and their JSON form
//! - **`naming`**: `{base}_elid{election_id}` instance name encode/decode
//! - **`transcode`**: declared config → node-list descriptor for the console
//! - **`types`**: election epochs and the descriptor sent to the node

pub mod config;
pub mod error;
pub mod naming;
pub mod transcode;
pub mod types;

pub use config::{validate_overlay_name, Member, MemberSpec, OverlayConfig, VALIDATORS_WILDCARD};
pub use error::{ConfigError, ConfigResult};
pub use naming::{decode_instance_name, encode_instance_name, InstanceName};
pub use transcode::{adnl_hex_to_base64, transcode};
pub use types::*;
