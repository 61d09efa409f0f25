//! Node registration with the host application.
//!
//! The host loads the plugin, calls its initialize entry point and expects
//! the plugin to register a data type and every node type it provides, then
//! undo both on unload. [`NodeRegistry`] holds the node table for one host
//! session; [`PluginSession`] drives the initialize/uninitialize order.

use anyhow::{bail, Context, Result};
use tracing::{debug, error};

/// Host-side kind of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Plain dependency-graph node.
    #[default]
    Dependency,
    /// Node that draws in the viewport.
    Locator,
}

/// One entry of the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub type_name: String,
    pub type_id: u32,
    pub kind: NodeKind,
    pub classification: Option<String>,
}

impl NodeInfo {
    pub fn new(type_name: impl Into<String>, type_id: u32) -> Self {
        Self {
            type_name: type_name.into(),
            type_id,
            kind: NodeKind::Dependency,
            classification: None,
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }
}

/// Registration surface offered by the host.
pub trait PluginHost {
    fn register_data(&mut self, type_name: &str, type_id: u32) -> Result<()>;
    fn deregister_data(&mut self, type_id: u32) -> Result<()>;
    fn register_node(&mut self, node: &NodeInfo) -> Result<()>;
    fn deregister_node(&mut self, node: &NodeInfo) -> Result<()>;
}

/// Node table for one host session.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<NodeInfo>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeInfo) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Registers every node in insertion order, stopping at the first
    /// failure.
    pub fn register_all(&self, host: &mut dyn PluginHost) -> Result<()> {
        for node in &self.nodes {
            host.register_node(node).with_context(|| {
                error!(type_name = %node.type_name, "node registration failed");
                format!("Failed to register '{}'", node.type_name)
            })?;
            debug!(type_name = %node.type_name, type_id = node.type_id, "registered node");
        }
        Ok(())
    }

    /// Deregisters every node in insertion order, stopping at the first
    /// failure.
    pub fn deregister_all(&self, host: &mut dyn PluginHost) -> Result<()> {
        for node in &self.nodes {
            host.deregister_node(node).with_context(|| {
                error!(type_name = %node.type_name, "node deregistration failed");
                format!("Failed to deregister '{}'", node.type_name)
            })?;
        }
        Ok(())
    }
}

/// Plugin load/unload sequence for one host session.
#[derive(Debug)]
pub struct PluginSession {
    data_type_name: String,
    data_type_id: u32,
    registry: NodeRegistry,
    initialized: bool,
}

impl PluginSession {
    pub fn new(data_type_name: impl Into<String>, data_type_id: u32, registry: NodeRegistry) -> Self {
        Self {
            data_type_name: data_type_name.into(),
            data_type_id,
            registry,
            initialized: false,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers the data type, then every node.
    pub fn initialize(&mut self, host: &mut dyn PluginHost) -> Result<()> {
        if self.initialized {
            bail!("plugin session already initialized");
        }
        host.register_data(&self.data_type_name, self.data_type_id)
            .with_context(|| format!("Failed to register '{}'", self.data_type_name))?;
        self.registry.register_all(host)?;
        self.initialized = true;
        Ok(())
    }

    /// Deregisters every node, then the data type.
    pub fn uninitialize(&mut self, host: &mut dyn PluginHost) -> Result<()> {
        self.registry.deregister_all(host)?;
        host.deregister_data(self.data_type_id)
            .with_context(|| format!("Failed to deregister '{}'", self.data_type_name))?;
        self.initialized = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<String>,
        reject: Option<String>,
    }

    impl PluginHost for RecordingHost {
        fn register_data(&mut self, type_name: &str, _type_id: u32) -> Result<()> {
            self.calls.push(format!("+data {type_name}"));
            Ok(())
        }

        fn deregister_data(&mut self, type_id: u32) -> Result<()> {
            self.calls.push(format!("-data {type_id}"));
            Ok(())
        }

        fn register_node(&mut self, node: &NodeInfo) -> Result<()> {
            if self.reject.as_deref() == Some(node.type_name.as_str()) {
                bail!("host refused");
            }
            match &node.classification {
                Some(class) => self.calls.push(format!("+{} [{class}]", node.type_name)),
                None => self.calls.push(format!("+{}", node.type_name)),
            }
            Ok(())
        }

        fn deregister_node(&mut self, node: &NodeInfo) -> Result<()> {
            self.calls.push(format!("-{}", node.type_name));
            Ok(())
        }
    }

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry
            .add(NodeInfo::new("VDBRead", 0x0011_0001))
            .add(NodeInfo::new("VDBWrite", 0x0011_0002))
            .add(
                NodeInfo::new("VDBVisualize", 0x0011_0003)
                    .with_kind(NodeKind::Locator)
                    .with_classification("drawdb/geometry/vdbvisualize"),
            );
        registry
    }

    #[test]
    fn session_registers_data_before_nodes() {
        let mut host = RecordingHost::default();
        let mut session = PluginSession::new("VDBData", 0x0011_0000, registry());

        session.initialize(&mut host).unwrap();
        session.uninitialize(&mut host).unwrap();

        assert_eq!(
            host.calls,
            [
                "+data VDBData",
                "+VDBRead",
                "+VDBWrite",
                "+VDBVisualize [drawdb/geometry/vdbvisualize]",
                "-VDBRead",
                "-VDBWrite",
                "-VDBVisualize",
                "-data 1114112",
            ]
        );
        assert!(!session.is_initialized());
    }

    #[test]
    fn registration_stops_at_first_failure() {
        let mut host = RecordingHost {
            reject: Some("VDBWrite".into()),
            ..Default::default()
        };

        let err = registry().register_all(&mut host).unwrap_err();
        assert_eq!(err.to_string(), "Failed to register 'VDBWrite'");
        assert_eq!(host.calls, ["+VDBRead"]);
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut host = RecordingHost::default();
        let mut session = PluginSession::new("VDBData", 1, NodeRegistry::new());
        session.initialize(&mut host).unwrap();
        assert!(session.initialize(&mut host).is_err());
    }

    #[test]
    fn clear_empties_the_table() {
        let mut registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.iter().filter(|n| n.kind == NodeKind::Locator).count(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }
}
