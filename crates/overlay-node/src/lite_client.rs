//! Election info read from the node's lite server.
//!
//! The current validator set is config param 34 and the next one, once
//! elected, is param 36. [`LiteClientElectionSource`] runs
//! `getconfig <param>` through the lite client and picks the fields it needs
//! out of the TL-B dump:
//!
//! ```text
//! ConfigParam(34) = (
//!   (validators_ext utime_since:1700000000 utime_until:1700065536 total:2 main:2 ...
//!     ... (validator_addr public_key:(ed25519_pubkey pubkey:x3A…) weight:… adnl_addr:xA1…) ...
//! ```
//!
//! Entries without an `adnl_addr` are not reachable through overlays and are
//! left out.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_core::ElectionEpochs;

use crate::election::{ElectionSnapshot, ElectionSource, ValidatorDescr, ValidatorSetParams};
use crate::error::{NodeError, NodeResult};

pub const CURRENT_VALIDATORS_PARAM: u32 = 34;
pub const NEXT_VALIDATORS_PARAM: u32 = 36;

/// How to reach the lite server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteClientConfig {
    /// Lite client executable.
    pub binary: PathBuf,
    /// Lite server public key (`--pub`).
    pub server_pub: PathBuf,
    /// Lite server address (`--addr`), `ip:port`.
    pub address: String,
}

impl Default for LiteClientConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("lite-client"),
            server_pub: PathBuf::from("/var/ton-work/keys/liteserver.pub"),
            address: "127.0.0.1:4443".to_string(),
        }
    }
}

/// [`ElectionSource`] that queries the lite server on every call.
#[derive(Debug, Clone)]
pub struct LiteClientElectionSource {
    config: LiteClientConfig,
}

impl LiteClientElectionSource {
    pub fn new(config: LiteClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LiteClientConfig {
        &self.config
    }

    /// Run one lite client command and return its stdout.
    pub fn run(&self, command: &str) -> NodeResult<String> {
        debug!(%command, "running lite client command");
        let output = Command::new(&self.config.binary)
            .arg("--addr")
            .arg(&self.config.address)
            .arg("--pub")
            .arg(&self.config.server_pub)
            .args(["--verbosity", "0", "--cmd", command])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| NodeError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?;

        let text = String::from_utf8(output.stdout)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NodeError::CommandFailed {
                command: command.to_string(),
                output: format!("{text}{}", stderr.trim_end()),
            });
        }
        Ok(text)
    }

    fn validator_set(&self, param: u32) -> NodeResult<Option<ValidatorSetParams>> {
        let dump = self.run(&format!("getconfig {param}"))?;
        parse_validator_set(param, &dump)
    }
}

impl ElectionSource for LiteClientElectionSource {
    fn epochs(&self) -> NodeResult<ElectionEpochs> {
        let current = self
            .validator_set(CURRENT_VALIDATORS_PARAM)?
            .ok_or_else(|| NodeError::ConfigParam {
                param: CURRENT_VALIDATORS_PARAM,
                reason: "no validator set in response".to_string(),
            })?;
        let next = self.validator_set(NEXT_VALIDATORS_PARAM)?;

        let epochs = ElectionEpochs::from(ElectionSnapshot { current, next });
        debug!(
            current = epochs.current_election_id,
            next = epochs.next_election_id,
            validators = epochs.current_validator_set.len(),
            "validator sets loaded from lite server"
        );
        Ok(epochs)
    }
}

/// Extract start time and validator ADNL addresses from a `getconfig`
/// dump. `None` when the parameter holds no validator set.
pub fn parse_validator_set(param: u32, dump: &str) -> NodeResult<Option<ValidatorSetParams>> {
    let since_re = Regex::new(r"utime_since:(\d+)")?;
    let adnl_re = Regex::new(r"adnl_addr:x([0-9A-Fa-f]{64})")?;

    let Some(caps) = since_re.captures(dump) else {
        return Ok(None);
    };
    let start_work_time = caps[1].parse::<u64>().map_err(|e| NodeError::ConfigParam {
        param,
        reason: format!("bad utime_since: {e}"),
    })?;

    let validators = adnl_re
        .captures_iter(dump)
        .map(|caps| ValidatorDescr {
            adnl_addr: caps[1].to_string(),
        })
        .collect();

    Ok(Some(ValidatorSetParams {
        start_work_time,
        validators,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: &str = "A100000000000000000000000000000000000000000000000000000000000001";
    const V2: &str = "A200000000000000000000000000000000000000000000000000000000000002";

    fn dump(param: u32, since: &str, adnls: &[&str]) -> String {
        let entries: String = adnls
            .iter()
            .map(|adnl| {
                format!(
                    "node:(hmn_leaf value:(validator_addr public_key:(ed25519_pubkey pubkey:x00FF) \
                     weight:1152921504606846976 adnl_addr:x{adnl})) "
                )
            })
            .collect();
        format!(
            "ConfigParam({param}) = (\n  (validators_ext utime_since:{since} utime_until:1700065536 \
             total:{n} main:{n} total_weight:1 list:(hm_edge {entries})))\n",
            n = adnls.len()
        )
    }

    #[test]
    fn parses_start_time_and_adnl_addresses_in_order() {
        let set = parse_validator_set(34, &dump(34, "1700000000", &[V1, V2]))
            .unwrap()
            .unwrap();

        assert_eq!(set.start_work_time, 1700000000);
        let adnls: Vec<&str> = set.validators.iter().map(|v| v.adnl_addr.as_str()).collect();
        assert_eq!(adnls, vec![V1, V2]);
    }

    #[test]
    fn validators_without_adnl_are_skipped() {
        let text = format!(
            "ConfigParam(34) = ((validators utime_since:100 utime_until:200 total:2 main:2 \
             list:(validator public_key:(ed25519_pubkey pubkey:x01) weight:1) \
             (validator_addr public_key:(ed25519_pubkey pubkey:x02) weight:1 adnl_addr:x{V2})))"
        );
        let set = parse_validator_set(34, &text).unwrap().unwrap();
        assert_eq!(set.validators.len(), 1);
        assert_eq!(set.validators[0].adnl_addr, V2);
    }

    #[test]
    fn absent_param_has_no_validator_set() {
        assert!(parse_validator_set(36, "ConfigParam(36) = (null)\n").unwrap().is_none());
        assert!(parse_validator_set(36, "").unwrap().is_none());
    }

    #[test]
    fn unparseable_start_time_is_an_error() {
        let text = dump(34, "99999999999999999999999", &[V1]);
        assert!(matches!(
            parse_validator_set(34, &text),
            Err(NodeError::ConfigParam { param: 34, .. })
        ));
    }

    #[test]
    fn next_set_without_validators_means_no_next_election() {
        let current = parse_validator_set(34, &dump(34, "100", &[V1])).unwrap().unwrap();
        let next = parse_validator_set(36, &dump(36, "200", &[])).unwrap();

        let epochs = ElectionEpochs::from(ElectionSnapshot { current, next });
        assert_eq!(epochs.current_election_id, 100);
        assert_eq!(epochs.current_validator_set, vec![V1]);
        assert!(!epochs.has_next());
    }
}
