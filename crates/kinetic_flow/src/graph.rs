// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow graph: node ownership, activation, history, and traversal.
//!
//! A graph holds one active node at most. Forward navigation
//! ([`FlowGraph::set_active_node`]) always lands exactly where directed and
//! records the pre-transition state on the history stack; backward
//! navigation ([`FlowGraph::go_back`]) pops the stack, skipping
//! transparently over passthrough nodes. Enter/exit/ping feedback is
//! queued as [`GraphEvent`]s for the external controller to drain.

use crate::node::{FlowNode, NodeId, NodeState};
use crate::port::{FlowPort, PortCapacity, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of a visual ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingDirection {
    /// Forward activation.
    Forward,
    /// Backward navigation.
    Back,
}

/// Visual-feedback events queued during traversal. No semantic effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A node became the active node.
    NodeEntered(NodeId),
    /// A node stopped being the active node.
    NodeExited(NodeId),
    /// A node was traversed.
    NodePinged {
        /// The traversed node.
        node: NodeId,
        /// Traversal direction.
        direction: PingDirection,
    },
    /// A port was traversed.
    PortPinged {
        /// The traversed port.
        port: PortId,
        /// Traversal direction.
        direction: PingDirection,
    },
    /// Two ports were connected.
    PortsConnected {
        /// One endpoint.
        from: PortId,
        /// The other endpoint.
        to: PortId,
    },
    /// Two ports were disconnected.
    PortsDisconnected {
        /// One endpoint.
        from: PortId,
        /// The other endpoint.
        to: PortId,
    },
}

/// Per-frame stage forwarded from the external driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStage {
    /// Variable-rate frame update.
    Update,
    /// Fixed-rate simulation update.
    FixedUpdate,
    /// Post-update, after all Updates ran.
    LateUpdate,
}

/// One record on the navigation history stack: the graph state right
/// before a forward activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `previous_active_node` before the activation.
    pub previous_node: Option<NodeId>,
    /// `previous_active_port` before the activation.
    pub previous_port: Option<PortId>,
    /// The node that was active before the activation.
    pub active_node: NodeId,
}

/// Error for failed connection operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Node not found.
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found.
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// The ports cannot legally connect.
    #[error("Illegal connection")]
    IllegalConnection,
}

/// A directed graph of flow nodes with navigation semantics.
#[derive(Serialize, Deserialize)]
pub struct FlowGraph {
    /// Unique graph ID.
    pub id: GraphId,
    /// Graph name.
    pub name: String,
    nodes: IndexMap<NodeId, FlowNode>,
    /// The node activated when the graph starts.
    pub root_node: Option<NodeId>,
    #[serde(skip)]
    active_node: Option<NodeId>,
    #[serde(skip)]
    previous_active_node: Option<NodeId>,
    #[serde(skip)]
    previous_active_port: Option<PortId>,
    #[serde(skip)]
    history: Vec<HistoryEntry>,
    #[serde(skip)]
    started: bool,
    #[serde(skip)]
    active_sub_graph: Option<Box<FlowGraph>>,
    #[serde(skip)]
    events: Vec<GraphEvent>,
}

impl Default for FlowGraph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl FlowGraph {
    /// Create a new empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            nodes: IndexMap::new(),
            root_node: None,
            active_node: None,
            previous_active_node: None,
            previous_active_port: None,
            history: Vec::new(),
            started: false,
            active_sub_graph: None,
            events: Vec::new(),
        }
    }

    // ── Node management ─────────────────────────────────────────────────

    /// Add a node. The first Start-role node becomes the root.
    pub fn add_node(&mut self, node: FlowNode) -> NodeId {
        let id = node.id;
        if self.root_node.is_none() && node.is_entry() {
            self.root_node = Some(id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node after disconnecting all of its ports. Active and
    /// previous pointers referencing it are cleared.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<FlowNode> {
        self.disconnect_node(node_id);
        if self.active_node == Some(node_id) {
            self.active_node = None;
        }
        if self.previous_active_node == Some(node_id) {
            self.previous_active_node = None;
        }
        if self.root_node == Some(node_id) {
            self.root_node = None;
        }
        self.history.retain(|entry| entry.active_node != node_id);
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID.
    pub fn node(&self, node_id: NodeId) -> Option<&FlowNode> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut FlowNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Find the first node with the given name.
    pub fn node_by_name(&self, name: &str) -> Option<&FlowNode> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve a port by ID across every node.
    pub fn port_by_id(&self, port_id: PortId) -> Option<&FlowPort> {
        self.nodes.values().find_map(|n| n.port(port_id))
    }

    fn port_mut_by_id(&mut self, port_id: PortId) -> Option<&mut FlowPort> {
        self.nodes.values_mut().find_map(|n| n.port_mut(port_id))
    }

    // ── Runtime state ───────────────────────────────────────────────────

    /// The active node, if any.
    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    /// The previously active node.
    pub fn previous_active_node(&self) -> Option<NodeId> {
        self.previous_active_node
    }

    /// The port the last activation came through.
    pub fn previous_active_port(&self) -> Option<PortId> {
        self.previous_active_port
    }

    /// The navigation history stack, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Whether the graph has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Drain queued traversal events.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Start the graph: global nodes begin running and the root node is
    /// activated.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        for node in self.nodes.values_mut() {
            if node.is_global() {
                node.state = NodeState::Running;
            }
        }
        tracing::debug!(graph = %self.name, "flow graph started");
        if let Some(root) = self.root_node {
            self.set_active_node(root, None);
        }
    }

    /// Stop the graph: the active node is exited and global nodes go idle.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        if let Some(active) = self.active_node.take() {
            if let Some(node) = self.nodes.get_mut(&active) {
                node.exit(false);
            }
            self.events.push(GraphEvent::NodeExited(active));
        }
        for node in self.nodes.values_mut() {
            if node.is_global() {
                node.state = NodeState::Idle;
            }
        }
        if let Some(sub) = &mut self.active_sub_graph {
            sub.stop();
        }
        tracing::debug!(graph = %self.name, "flow graph stopped");
    }

    /// Stop, drop stale connection ids, and clear navigation state.
    pub fn reset(&mut self) {
        self.stop();
        self.clean();
        self.history.clear();
        self.previous_active_node = None;
        self.previous_active_port = None;
        self.events.clear();
    }

    /// Drop every connection id that no longer resolves to a live port.
    /// Defends against stale ids after node or port deletion elsewhere.
    pub fn clean(&mut self) {
        let live: std::collections::HashSet<PortId> = self
            .nodes
            .values()
            .flat_map(|n| n.ports().map(|p| p.id))
            .collect();
        let mut dropped = 0usize;
        for node in self.nodes.values_mut() {
            for port in node.ports_mut() {
                let before = port.connections.len();
                port.connections.retain(|id| live.contains(id));
                dropped += before - port.connections.len();
            }
        }
        if dropped > 0 {
            tracing::debug!(graph = %self.name, dropped, "dropped stale connection ids");
        }
    }

    // ── Forward navigation ──────────────────────────────────────────────

    /// Make `node_id` the active node.
    ///
    /// Exits the current active node, records the pre-transition state on
    /// the history stack (skipped when nothing was active), enters the new
    /// node, and pings it and the source port. Entering a node with the
    /// `clear_graph_history` flag clears the stack after entering, which
    /// also discards the record pushed by this call.
    pub fn set_active_node(&mut self, node_id: NodeId, from_port: Option<PortId>) -> bool {
        if !self.nodes.contains_key(&node_id) {
            return false;
        }

        if let Some(current) = self.active_node {
            if let Some(node) = self.nodes.get_mut(&current) {
                node.exit(self.started);
            }
            self.events.push(GraphEvent::NodeExited(current));
            self.history.push(HistoryEntry {
                previous_node: self.previous_active_node,
                previous_port: self.previous_active_port,
                active_node: current,
            });
        }

        self.previous_active_node = self.active_node;
        self.previous_active_port = from_port;
        self.active_node = Some(node_id);

        let mut clear_history = false;
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.enter();
            clear_history = node.clear_graph_history;
        }
        self.events.push(GraphEvent::NodeEntered(node_id));
        if clear_history {
            self.history.clear();
        }

        self.events.push(GraphEvent::NodePinged {
            node: node_id,
            direction: PingDirection::Forward,
        });
        if let Some(port) = from_port {
            self.events.push(GraphEvent::PortPinged {
                port,
                direction: PingDirection::Forward,
            });
        }

        tracing::trace!(graph = %self.name, node = ?node_id, "node activated");
        true
    }

    /// Activate the first node with the given name.
    pub fn set_active_node_by_name(&mut self, name: &str, from_port: Option<PortId>) -> bool {
        match self.node_by_name(name).map(|n| n.id) {
            Some(id) => self.set_active_node(id, from_port),
            None => false,
        }
    }

    // ── Backward navigation ─────────────────────────────────────────────

    /// Step back to the most recent non-passthrough node on the history
    /// stack.
    ///
    /// Passthrough nodes are popped and pinged (Back direction) but not
    /// landed on. No-ops: empty history, a Start/Enter previous node, or a
    /// degenerate all-passthrough history with a passthrough active node.
    pub fn go_back(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }

        // Navigation never returns to a graph entry point.
        if let Some(previous) = self.previous_active_node {
            if self.nodes.get(&previous).is_some_and(FlowNode::is_entry) {
                return false;
            }
        }

        // Nothing to land on: every history entry is passthrough and so is
        // the active node.
        let active_passthrough = self
            .active_node
            .and_then(|id| self.nodes.get(&id))
            .is_some_and(|n| n.passthrough);
        let all_passthrough = self.history.iter().all(|entry| {
            self.nodes
                .get(&entry.active_node)
                .is_some_and(|n| n.passthrough)
        });
        if all_passthrough && active_passthrough {
            return false;
        }

        // Pop passthrough entries, remembering them for Back pings.
        let mut skipped_nodes = Vec::new();
        let mut skipped_ports = Vec::new();
        while let Some(top) = self.history.last() {
            let passthrough = self
                .nodes
                .get(&top.active_node)
                .is_some_and(|n| n.passthrough);
            if !passthrough {
                break;
            }
            let entry = match self.history.pop() {
                Some(entry) => entry,
                None => break,
            };
            skipped_nodes.push(entry.active_node);
            if let Some(port) = entry.previous_port {
                skipped_ports.push(port);
            }
        }

        // The skip loop drained the stack without finding a landing node.
        let Some(landing) = self.history.last().copied() else {
            return false;
        };
        if !self.nodes.contains_key(&landing.active_node) {
            return false;
        }

        if let Some(current) = self.active_node {
            if let Some(node) = self.nodes.get_mut(&current) {
                node.exit(self.started);
            }
            self.events.push(GraphEvent::NodeExited(current));
        }

        for node in skipped_nodes {
            self.events.push(GraphEvent::NodePinged {
                node,
                direction: PingDirection::Back,
            });
        }
        for port in skipped_ports {
            self.events.push(GraphEvent::PortPinged {
                port,
                direction: PingDirection::Back,
            });
        }

        // Adopt the popped record without pushing a new one.
        self.history.pop();
        self.previous_active_node = landing.previous_node;
        self.previous_active_port = landing.previous_port;
        self.active_node = Some(landing.active_node);
        if let Some(node) = self.nodes.get_mut(&landing.active_node) {
            node.enter();
        }
        self.events.push(GraphEvent::NodeEntered(landing.active_node));

        tracing::trace!(graph = %self.name, node = ?landing.active_node, "went back");
        true
    }

    // ── Per-frame ticking ───────────────────────────────────────────────

    /// Forward a per-frame stage to every running global node, skipping
    /// one that is currently the active node, then recurse into the active
    /// sub-graph.
    pub fn tick(&mut self, stage: TickStage, dt: f32, visitor: &mut dyn FnMut(&mut FlowNode, TickStage, f32)) {
        if !self.started {
            return;
        }
        let active = self.active_node;
        for node in self.nodes.values_mut() {
            if node.is_global() && Some(node.id) != active {
                visitor(node, stage, dt);
            }
        }
        if let Some(sub) = &mut self.active_sub_graph {
            sub.tick(stage, dt, visitor);
        }
    }

    // ── Sub-graphs ──────────────────────────────────────────────────────

    /// Attach and start a sub-graph. Ticks recurse into it while attached.
    pub fn enter_sub_graph(&mut self, mut graph: FlowGraph) {
        graph.start();
        self.active_sub_graph = Some(Box::new(graph));
    }

    /// Stop and detach the active sub-graph.
    pub fn exit_sub_graph(&mut self) -> Option<FlowGraph> {
        let mut graph = self.active_sub_graph.take()?;
        graph.stop();
        Some(*graph)
    }

    /// The active sub-graph, if any.
    pub fn active_sub_graph(&self) -> Option<&FlowGraph> {
        self.active_sub_graph.as_deref()
    }

    // ── Connections ─────────────────────────────────────────────────────

    /// Connect an output port to an input port.
    ///
    /// A `Single`-capacity endpoint drops its existing connection first.
    /// Both sides' connection lists are updated together.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<(), FlowError> {
        let source_node = self
            .nodes
            .get(&from_node)
            .ok_or(FlowError::NodeNotFound(from_node))?;
        let target_node = self
            .nodes
            .get(&to_node)
            .ok_or(FlowError::NodeNotFound(to_node))?;
        let source = source_node
            .port(from_port)
            .ok_or(FlowError::PortNotFound(from_port))?;
        let target = target_node
            .port(to_port)
            .ok_or(FlowError::PortNotFound(to_port))?;

        if !source.can_connect(target) {
            return Err(FlowError::IllegalConnection);
        }

        // Single-capacity ports replace their existing connection.
        let source_drops = if source.capacity == PortCapacity::Single {
            source.connections.clone()
        } else {
            Vec::new()
        };
        let target_drops = if target.capacity == PortCapacity::Single {
            target.connections.clone()
        } else {
            Vec::new()
        };
        for peer in source_drops {
            self.disconnect_ports(from_port, peer);
        }
        for peer in target_drops {
            self.disconnect_ports(to_port, peer);
        }

        if let Some(port) = self.port_mut_by_id(from_port) {
            port.connections.push(to_port);
        }
        if let Some(port) = self.port_mut_by_id(to_port) {
            port.connections.push(from_port);
        }
        self.events.push(GraphEvent::PortsConnected {
            from: from_port,
            to: to_port,
        });
        Ok(())
    }

    /// Remove the connection between two ports from both sides. Returns
    /// whether anything was removed.
    pub fn disconnect_ports(&mut self, a: PortId, b: PortId) -> bool {
        let mut removed = false;
        if let Some(port) = self.port_mut_by_id(a) {
            let before = port.connections.len();
            port.connections.retain(|id| *id != b);
            removed |= port.connections.len() != before;
        }
        if let Some(port) = self.port_mut_by_id(b) {
            let before = port.connections.len();
            port.connections.retain(|id| *id != a);
            removed |= port.connections.len() != before;
        }
        if removed {
            self.events
                .push(GraphEvent::PortsDisconnected { from: a, to: b });
        }
        removed
    }

    /// Remove every connection of a port.
    pub fn disconnect_port(&mut self, port_id: PortId) {
        let peers = match self.port_by_id(port_id) {
            Some(port) => port.connections.clone(),
            None => return,
        };
        for peer in peers {
            self.disconnect_ports(port_id, peer);
        }
    }

    /// Remove a port's connections to any port of the given node.
    pub fn disconnect_port_from_node(&mut self, port_id: PortId, node_id: NodeId) {
        let peers = match self.port_by_id(port_id) {
            Some(port) => port.connections.clone(),
            None => return,
        };
        for peer in peers {
            let owned = self
                .port_by_id(peer)
                .map(|p| p.node_id == node_id)
                .unwrap_or(false);
            if owned {
                self.disconnect_ports(port_id, peer);
            }
        }
    }

    /// Remove every connection of every port on a node.
    pub fn disconnect_node(&mut self, node_id: NodeId) {
        let ports: Vec<PortId> = match self.nodes.get(&node_id) {
            Some(node) => node.ports().map(|p| p.id).collect(),
            None => return,
        };
        for port in ports {
            self.disconnect_port(port);
        }
    }

    /// Remove every connection between two nodes.
    pub fn disconnect_node_from_node(&mut self, a: NodeId, b: NodeId) {
        let ports: Vec<PortId> = match self.nodes.get(&a) {
            Some(node) => node.ports().map(|p| p.id).collect(),
            None => return,
        };
        for port in ports {
            self.disconnect_port_from_node(port, b);
        }
    }
}
