//! In-memory [`ControlInterface`].
//!
//! Holds a list of deployed overlay names and records every add/delete it
//! receives. Used for dry runs (seeded from the real node, nothing is sent)
//! and as the node double in reconciler tests.

use std::collections::HashSet;
use std::sync::Mutex;

use overlay_core::NodeListDescriptor;

use crate::console::{ControlInterface, ADD_COMMAND, DELETE_COMMAND, SHOW_COMMAND};
use crate::error::{NodeError, NodeResult};

/// A command received by [`InMemoryConsole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOp {
    Add(NodeListDescriptor),
    Delete(String),
}

impl ConsoleOp {
    /// Name of the overlay instance the command targets.
    pub fn name(&self) -> &str {
        match self {
            ConsoleOp::Add(descriptor) => &descriptor.name,
            ConsoleOp::Delete(name) => name,
        }
    }
}

#[derive(Debug)]
pub struct InMemoryConsole {
    overlays: Mutex<Vec<String>>,
    ops: Mutex<Vec<ConsoleOp>>,
    /// Instance names whose add/delete is refused.
    rejected: HashSet<String>,
    supported: bool,
}

impl Default for InMemoryConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConsole {
    pub fn new() -> Self {
        Self {
            overlays: Mutex::new(Vec::new()),
            ops: Mutex::new(Vec::new()),
            rejected: HashSet::new(),
            supported: true,
        }
    }

    /// Start with these overlays already deployed.
    pub fn with_overlays<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overlays
            .lock()
            .unwrap()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Refuse add/delete for `name`, like a node answering without `success`.
    pub fn rejecting(mut self, name: &str) -> Self {
        self.rejected.insert(name.to_string());
        self
    }

    /// Behave like a node build without custom overlay support.
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Currently deployed overlay names.
    pub fn overlays(&self) -> Vec<String> {
        self.overlays.lock().unwrap().clone()
    }

    /// Every add/delete received so far, including refused ones.
    pub fn ops(&self) -> Vec<ConsoleOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    fn refuse(&self, command: &str, name: &str) -> NodeResult<()> {
        if self.rejected.contains(name) {
            return Err(NodeError::CommandFailed {
                command: format!("{command} {name}"),
                output: "error: rejected".to_string(),
            });
        }
        Ok(())
    }
}

impl ControlInterface for InMemoryConsole {
    fn list(&self) -> NodeResult<Vec<String>> {
        if !self.supported {
            return Err(NodeError::Unsupported {
                command: SHOW_COMMAND.to_string(),
            });
        }
        Ok(self.overlays())
    }

    fn add(&self, descriptor: &NodeListDescriptor) -> NodeResult<()> {
        self.ops.lock().unwrap().push(ConsoleOp::Add(descriptor.clone()));
        self.refuse(ADD_COMMAND, &descriptor.name)?;

        let mut overlays = self.overlays.lock().unwrap();
        if !overlays.contains(&descriptor.name) {
            overlays.push(descriptor.name.clone());
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> NodeResult<()> {
        self.ops.lock().unwrap().push(ConsoleOp::Delete(name.to_string()));
        self.refuse(DELETE_COMMAND, name)?;

        let mut overlays = self.overlays.lock().unwrap();
        let before = overlays.len();
        overlays.retain(|o| o != name);
        if overlays.len() == before {
            return Err(NodeError::CommandFailed {
                command: format!("{DELETE_COMMAND} {name}"),
                output: "error: overlay not found".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> NodeListDescriptor {
        NodeListDescriptor {
            name: name.to_string(),
            nodes: Vec::new(),
        }
    }

    #[test]
    fn add_and_delete_update_overlays() {
        let console = InMemoryConsole::new().with_overlays(["a"]);

        console.add(&descriptor("b")).unwrap();
        console.delete("a").unwrap();

        assert_eq!(console.list().unwrap(), vec!["b"]);
        assert_eq!(
            console.ops(),
            vec![ConsoleOp::Add(descriptor("b")), ConsoleOp::Delete("a".to_string())]
        );
    }

    #[test]
    fn rejected_names_fail_but_are_recorded() {
        let console = InMemoryConsole::new().with_overlays(["a"]).rejecting("a");

        assert!(console.delete("a").is_err());
        assert_eq!(console.overlays(), vec!["a"]);
        assert_eq!(console.ops().len(), 1);
        assert_eq!(console.ops()[0].name(), "a");
    }

    #[test]
    fn deleting_unknown_overlay_fails() {
        let console = InMemoryConsole::new();
        assert!(matches!(
            console.delete("ghost"),
            Err(NodeError::CommandFailed { .. })
        ));
    }

    #[test]
    fn unsupported_node_refuses_listing() {
        let console = InMemoryConsole::new().unsupported();
        assert!(matches!(console.list(), Err(NodeError::Unsupported { .. })));
    }

    #[test]
    fn clear_ops_keeps_overlays() {
        let console = InMemoryConsole::new();
        console.add(&descriptor("a")).unwrap();
        console.clear_ops();

        assert!(console.ops().is_empty());
        assert_eq!(console.overlays(), vec!["a"]);
    }
}
