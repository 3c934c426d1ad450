//! Instance names on the node.
//!
//! Static overlays are deployed under the config name. Overlays that expand
//! `@validators` are deployed once per live election as
//! `{base}_elid{election_id}`.

use crate::types::ElectionId;

const ELECTION_MARKER: &str = "_elid";

/// A decoded instance name. `election_id` is `None` for static instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceName<'a> {
    /// Config name the instance was deployed from.
    pub base: &'a str,
    pub election_id: Option<ElectionId>,
}

pub fn encode_instance_name(base: &str, election_id: ElectionId) -> String {
    format!("{base}{ELECTION_MARKER}{election_id}")
}

/// Split an instance name into base and election id. Never fails: anything
/// that is not `{non-empty base}_elid{digits}` decodes as a static name.
pub fn decode_instance_name(name: &str) -> InstanceName<'_> {
    let scoped = name
        .rsplit_once(ELECTION_MARKER)
        .filter(|(base, digits)| {
            !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        })
        .and_then(|(base, digits)| Some((base, digits.parse::<ElectionId>().ok()?)));

    match scoped {
        Some((base, election_id)) => InstanceName {
            base,
            election_id: Some(election_id),
        },
        None => InstanceName {
            base: name,
            election_id: None,
        },
    }
}
