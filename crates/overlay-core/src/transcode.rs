//! Declared config → node-list descriptor.
//!
//! Bridges the operator-facing body (hex ADNL keys, `@validators`) to the
//! descriptor `addcustomoverlay` understands (base64 ADNL ids, one entry per
//! node). Node order follows the body; the wildcard expands in validator-set
//! order at its position. Nothing is sorted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::{Member, OverlayConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::types::{NodeEntry, NodeListDescriptor};

/// Build the descriptor for instance `name`.
///
/// `validator_set` is required when the body contains `@validators` and
/// ignored otherwise.
pub fn transcode(
    name: &str,
    config: &OverlayConfig,
    validator_set: Option<&[String]>,
) -> ConfigResult<NodeListDescriptor> {
    let mut nodes = Vec::with_capacity(config.members().len());

    for member in config.members() {
        match member {
            Member::Validators => {
                let vset = validator_set.ok_or_else(|| ConfigError::MissingValidatorSet {
                    overlay: name.to_string(),
                })?;
                for adnl in vset {
                    nodes.push(NodeEntry {
                        adnl_id: adnl_hex_to_base64(adnl)?,
                        msg_sender: false,
                        msg_sender_priority: None,
                    });
                }
            }
            Member::Node { adnl, spec } => nodes.push(NodeEntry {
                adnl_id: adnl_hex_to_base64(adnl)?,
                msg_sender: spec.msg_sender,
                msg_sender_priority: spec.msg_sender_priority.filter(|_| spec.msg_sender),
            }),
        }
    }

    Ok(NodeListDescriptor {
        name: name.to_string(),
        nodes,
    })
}

/// Re-encode a hex ADNL address as standard padded base64.
pub fn adnl_hex_to_base64(adnl: &str) -> ConfigResult<String> {
    let bytes = hex::decode(adnl).map_err(|e| ConfigError::InvalidAddress {
        address: adnl.to_string(),
        reason: e.to_string(),
    })?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemberSpec;

    const A: &str = "aa00000000000000000000000000000000000000000000000000000000000001";
    const B: &str = "bb00000000000000000000000000000000000000000000000000000000000002";
    const X: &str = "0c00000000000000000000000000000000000000000000000000000000000003";

    fn vset(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn hex_to_base64_known_vectors() {
        assert_eq!(adnl_hex_to_base64("0102").unwrap(), "AQI=");
        assert_eq!(adnl_hex_to_base64("FFFF").unwrap(), "//8=");
        assert_eq!(
            adnl_hex_to_base64(&"00".repeat(32)).unwrap(),
            format!("{}=", "A".repeat(43))
        );
        assert!(matches!(
            adnl_hex_to_base64("xyz"),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn wildcard_expands_validator_set_in_order() {
        let config = OverlayConfig::from_json_str(r#"{"@validators": true}"#).unwrap();
        let validators = vset(&[A, B]);

        let descriptor = transcode("ov_elid100", &config, Some(&validators)).unwrap();

        assert_eq!(descriptor.name, "ov_elid100");
        assert_eq!(descriptor.nodes.len(), 2);
        assert_eq!(descriptor.nodes[0].adnl_id, adnl_hex_to_base64(A).unwrap());
        assert_eq!(descriptor.nodes[1].adnl_id, adnl_hex_to_base64(B).unwrap());
        for node in &descriptor.nodes {
            assert!(!node.msg_sender);
            assert_eq!(node.msg_sender_priority, None);
        }
    }

    #[test]
    fn enumerated_sender_keeps_priority() {
        let json = format!(r#"{{"{X}": {{"msg_sender": true, "msg_sender_priority": 5}}}}"#);
        let config = OverlayConfig::from_json_str(&json).unwrap();

        let descriptor = transcode("static", &config, None).unwrap();

        assert_eq!(descriptor.nodes.len(), 1);
        let node = &descriptor.nodes[0];
        assert_eq!(node.adnl_id, adnl_hex_to_base64(X).unwrap());
        assert!(node.msg_sender);
        assert_eq!(node.msg_sender_priority, Some(5));
    }

    #[test]
    fn receiver_priority_is_dropped() {
        let json = format!(r#"{{"{X}": {{"msg_sender": false, "msg_sender_priority": 5}}}}"#);
        let config = OverlayConfig::from_json_str(&json).unwrap();

        let descriptor = transcode("static", &config, None).unwrap();
        assert_eq!(descriptor.nodes[0].msg_sender_priority, None);
    }

    #[test]
    fn wildcard_without_validator_set_fails() {
        let config = OverlayConfig::new().with_validators();
        let result = transcode("ov", &config, None);
        assert!(matches!(
            result,
            Err(ConfigError::MissingValidatorSet { overlay }) if overlay == "ov"
        ));
    }

    #[test]
    fn mixed_body_keeps_declaration_order() {
        let config = OverlayConfig::new()
            .with_node(X, MemberSpec::sender(1))
            .with_validators()
            .with_node(A, MemberSpec::receiver());
        let validators = vset(&[B]);

        let descriptor = transcode("mixed_elid7", &config, Some(&validators)).unwrap();
        let ids: Vec<&str> = descriptor.nodes.iter().map(|n| n.adnl_id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                adnl_hex_to_base64(X).unwrap(),
                adnl_hex_to_base64(B).unwrap(),
                adnl_hex_to_base64(A).unwrap(),
            ]
        );
    }

    #[test]
    fn static_body_ignores_supplied_validator_set() {
        let config = OverlayConfig::new().with_node(A, MemberSpec::receiver());
        let validators = vset(&[B]);

        let descriptor = transcode("static", &config, Some(&validators)).unwrap();
        assert_eq!(descriptor.nodes.len(), 1);
    }

    #[test]
    fn bad_validator_address_fails() {
        let config = OverlayConfig::new().with_validators();
        let validators = vset(&["zz"]);
        assert!(matches!(
            transcode("ov", &config, Some(&validators)),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }
}
