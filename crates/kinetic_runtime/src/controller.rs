// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow controller: the external driver that owns a graph.
//!
//! The controller defers the graph start by a fixed two-frame delay so the
//! embedding UI finishes its own first layout passes, then forwards the
//! per-frame stages. In multiplayer setups a controller can be bound to one
//! player; backward navigation from any other player is ignored.

use kinetic_flow::{FlowGraph, FlowNode, GraphEvent, NodeId, TickStage};

/// Frames to wait before starting the owned graph.
const START_DELAY_FRAMES: u8 = 2;

/// Per-frame node behavior supplied by the embedder.
pub type NodeHandler = Box<dyn FnMut(&mut FlowNode, TickStage, f32)>;

/// Owns a [`FlowGraph`] and pumps its per-frame updates.
pub struct FlowController {
    graph: FlowGraph,
    player_index: Option<u32>,
    start_countdown: u8,
    on_node_tick: Option<NodeHandler>,
}

impl FlowController {
    /// Create a controller owning the graph.
    pub fn new(graph: FlowGraph) -> Self {
        Self {
            graph,
            player_index: None,
            start_countdown: START_DELAY_FRAMES,
            on_node_tick: None,
        }
    }

    /// Bind the controller to a player.
    pub fn with_player_index(mut self, player_index: u32) -> Self {
        self.player_index = Some(player_index);
        self
    }

    /// The bound player, if any.
    pub fn player_index(&self) -> Option<u32> {
        self.player_index
    }

    /// The owned graph.
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Mutable access to the owned graph.
    pub fn graph_mut(&mut self) -> &mut FlowGraph {
        &mut self.graph
    }

    /// Install the per-frame behavior for global nodes.
    pub fn set_node_handler(&mut self, handler: impl FnMut(&mut FlowNode, TickStage, f32) + 'static) {
        self.on_node_tick = Some(Box::new(handler));
    }

    /// Whether the deferred start has happened.
    pub fn is_started(&self) -> bool {
        self.graph.is_started()
    }

    /// Per-frame update. The first calls burn the start delay; afterwards
    /// the stage is forwarded to the graph.
    pub fn update(&mut self, dt: f32) {
        if !self.graph.is_started() {
            if self.start_countdown > 0 {
                self.start_countdown -= 1;
                if self.start_countdown == 0 {
                    tracing::debug!(graph = %self.graph.name, "controller starting graph");
                    self.graph.start();
                }
            }
            return;
        }
        self.forward(TickStage::Update, dt);
    }

    /// Fixed-rate update, forwarded once the graph has started.
    pub fn fixed_update(&mut self, dt: f32) {
        if self.graph.is_started() {
            self.forward(TickStage::FixedUpdate, dt);
        }
    }

    /// Post-update, forwarded once the graph has started.
    pub fn late_update(&mut self, dt: f32) {
        if self.graph.is_started() {
            self.forward(TickStage::LateUpdate, dt);
        }
    }

    fn forward(&mut self, stage: TickStage, dt: f32) {
        match &mut self.on_node_tick {
            Some(handler) => self.graph.tick(stage, dt, handler.as_mut()),
            None => self.graph.tick(stage, dt, &mut |_, _, _| {}),
        }
    }

    /// Activate a node by id.
    pub fn set_active_node(&mut self, node_id: NodeId) -> bool {
        self.graph.set_active_node(node_id, None)
    }

    /// Activate the first node with the given name.
    pub fn set_active_node_by_name(&mut self, name: &str) -> bool {
        self.graph.set_active_node_by_name(name, None)
    }

    /// Navigate back, gated to the bound player.
    ///
    /// An unbound controller accepts any caller. A bound controller only
    /// honors its own player; every other index is ignored.
    pub fn go_back(&mut self, player_index: Option<u32>) -> bool {
        if let Some(bound) = self.player_index {
            if player_index != Some(bound) {
                return false;
            }
        }
        self.graph.go_back()
    }

    /// Drain the graph's queued traversal events.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        self.graph.take_events()
    }
}
