// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow-graph engine for Kinetic.
//!
//! This crate provides the UI navigation state machine:
//! - Nodes with typed, directional ports
//! - One active node per graph, with enter/exit transitions
//! - History stack with backward navigation and passthrough skipping
//! - Global nodes running independently of the active node
//! - Owned sub-graph recursion
//! - Symmetric id-based connection management
//!
//! ## Architecture
//!
//! Nodes and ports are plain serializable data; all traversal behavior
//! lives on [`FlowGraph`]. Per-frame node logic is supplied by the external
//! driver as a visitor passed to [`FlowGraph::tick`], and visual feedback
//! (enter/exit/ping) is queued as [`GraphEvent`]s drained via
//! [`FlowGraph::take_events`].

pub mod graph;
pub mod node;
pub mod port;

pub use graph::{
    FlowError, FlowGraph, GraphEvent, GraphId, HistoryEntry, PingDirection, TickStage,
};
pub use node::{FlowNode, NodeId, NodeKind, NodeRole, NodeState};
pub use port::{FlowPort, PortCapacity, PortDirection, PortId, PortValue};
