//! Console response parsing.
//!
//! The console answers in free text. Success is signalled by the word
//! `success` anywhere in the reply, old builds answer `unknown command`,
//! and `showcustomoverlays` prints one `Overlay "<name>" ...` line per
//! deployed overlay.

use regex::Regex;

use crate::error::NodeResult;

pub const SUCCESS_TOKEN: &str = "success";
pub const UNKNOWN_COMMAND: &str = "unknown command";

pub fn is_success(response: &str) -> bool {
    response.contains(SUCCESS_TOKEN)
}

pub fn is_unknown_command(response: &str) -> bool {
    response.contains(UNKNOWN_COMMAND)
}

/// Extract overlay names from a `showcustomoverlays` reply, in reply order.
pub fn parse_overlay_list(response: &str) -> NodeResult<Vec<String>> {
    let overlay_re = Regex::new(r#"^Overlay\s+(?:"([^"]*)"|(\S+))"#)?;

    let names = response
        .lines()
        .filter_map(|line| overlay_re.captures(line))
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    Ok(names)
}
