// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the flow graph.

use crate::port::{FlowPort, PortId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node, stable across serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a node runs continuously or only while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NodeKind {
    /// Runs only while it is the active node.
    #[default]
    Normal,
    /// Runs its per-frame hooks for as long as the graph is started,
    /// independent of being the active node.
    Global,
}

/// Reserved entry roles. Backward navigation refuses to return to entry
/// nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NodeRole {
    /// Ordinary node.
    #[default]
    Standard,
    /// The graph's start node.
    Start,
    /// A sub-graph entry node.
    Enter,
}

/// Per-node runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NodeState {
    /// Not active.
    #[default]
    Idle,
    /// The graph's active node.
    Active,
    /// A global node in a started graph.
    Running,
}

/// A node in a flow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    /// Unique node ID.
    pub id: NodeId,
    /// Display name, unique enough for name-based activation.
    pub name: String,
    /// Normal or Global.
    pub kind: NodeKind,
    /// Entry role.
    pub role: NodeRole,
    /// Runtime state.
    pub state: NodeState,
    /// Backward navigation skips over this node transparently.
    pub passthrough: bool,
    /// Entering this node clears the graph history.
    pub clear_graph_history: bool,
    /// Input ports.
    pub inputs: Vec<FlowPort>,
    /// Output ports.
    pub outputs: Vec<FlowPort>,
}

impl FlowNode {
    /// Create a standard node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            kind: NodeKind::Normal,
            role: NodeRole::Standard,
            state: NodeState::Idle,
            passthrough: false,
            clear_graph_history: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Create a start node.
    pub fn start(name: impl Into<String>) -> Self {
        let mut node = Self::new(name);
        node.role = NodeRole::Start;
        node
    }

    /// Mark as a global node.
    pub fn global(mut self) -> Self {
        self.kind = NodeKind::Global;
        self
    }

    /// Mark as passthrough for backward navigation.
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    /// Clear graph history when entered.
    pub fn clearing_history(mut self) -> Self {
        self.clear_graph_history = true;
        self
    }

    /// Add an input port, fixing up its node back-reference.
    pub fn with_input(mut self, mut port: FlowPort) -> Self {
        port.node_id = self.id;
        self.inputs.push(port);
        self
    }

    /// Add an output port, fixing up its node back-reference.
    pub fn with_output(mut self, mut port: FlowPort) -> Self {
        port.node_id = self.id;
        self.outputs.push(port);
        self
    }

    /// Add an input port in place.
    pub fn add_input(&mut self, mut port: FlowPort) -> PortId {
        port.node_id = self.id;
        let id = port.id;
        self.inputs.push(port);
        id
    }

    /// Add an output port in place.
    pub fn add_output(&mut self, mut port: FlowPort) -> PortId {
        port.node_id = self.id;
        let id = port.id;
        self.outputs.push(port);
        id
    }

    /// Whether this node is an entry node (Start or Enter role).
    pub fn is_entry(&self) -> bool {
        matches!(self.role, NodeRole::Start | NodeRole::Enter)
    }

    /// Whether this is a global node.
    pub fn is_global(&self) -> bool {
        self.kind == NodeKind::Global
    }

    /// Get a port by ID, searching inputs then outputs.
    pub fn port(&self, port_id: PortId) -> Option<&FlowPort> {
        self.inputs
            .iter()
            .find(|p| p.id == port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == port_id))
    }

    /// Get a mutable port by ID.
    pub fn port_mut(&mut self, port_id: PortId) -> Option<&mut FlowPort> {
        self.inputs
            .iter_mut()
            .find(|p| p.id == port_id)
            .or_else(|| self.outputs.iter_mut().find(|p| p.id == port_id))
    }

    /// All ports, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = &FlowPort> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// All ports, mutable.
    pub fn ports_mut(&mut self) -> impl Iterator<Item = &mut FlowPort> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    /// First input port.
    pub fn first_input(&self) -> Option<&FlowPort> {
        self.inputs.first()
    }

    /// First output port.
    pub fn first_output(&self) -> Option<&FlowPort> {
        self.outputs.first()
    }

    /// Transition to Active. Graph use only.
    pub(crate) fn enter(&mut self) {
        self.state = NodeState::Active;
    }

    /// Transition out of Active. Global nodes in a started graph fall back
    /// to Running, everything else to Idle. Graph use only.
    pub(crate) fn exit(&mut self, graph_started: bool) {
        self.state = if self.is_global() && graph_started {
            NodeState::Running
        } else {
            NodeState::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_get_node_back_reference() {
        let node = FlowNode::new("menu")
            .with_input(FlowPort::input("enter"))
            .with_output(FlowPort::output("next"));
        assert!(node.ports().all(|p| p.node_id == node.id));
    }

    #[test]
    fn test_port_lookup_spans_both_lists() {
        let node = FlowNode::new("menu")
            .with_input(FlowPort::input("enter"))
            .with_output(FlowPort::output("next"));
        let input_id = node.inputs[0].id;
        let output_id = node.outputs[0].id;
        assert!(node.port(input_id).is_some());
        assert!(node.port(output_id).is_some());
        assert!(node.port(PortId::new()).is_none());
    }

    #[test]
    fn test_entry_roles() {
        assert!(FlowNode::start("start").is_entry());
        assert!(!FlowNode::new("menu").is_entry());
    }

    #[test]
    fn test_exit_state_depends_on_kind() {
        let mut normal = FlowNode::new("menu");
        normal.enter();
        normal.exit(true);
        assert_eq!(normal.state, NodeState::Idle);

        let mut global = FlowNode::new("background").global();
        global.enter();
        global.exit(true);
        assert_eq!(global.state, NodeState::Running);
        global.exit(false);
        assert_eq!(global.state, NodeState::Idle);
    }

    #[test]
    fn test_serialization_round_trip() {
        let node = FlowNode::new("settings")
            .passthrough()
            .with_input(FlowPort::input("enter").single())
            .with_output(FlowPort::output("back"));
        let text = ron::to_string(&node).unwrap();
        let loaded: FlowNode = ron::from_str(&text).unwrap();
        assert_eq!(loaded.id, node.id);
        assert!(loaded.passthrough);
        assert_eq!(loaded.inputs.len(), 1);
        assert_eq!(loaded.outputs.len(), 1);
    }
}
