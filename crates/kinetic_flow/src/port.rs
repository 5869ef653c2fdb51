// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for flow nodes.
//!
//! Ports store their connections as lists of peer port ids, never object
//! references, so a persisted graph only has to round-trip ids exactly and
//! re-resolve peers by lookup after load.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port, stable across serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Receives activations.
    Input,
    /// Emits activations.
    Output,
}

/// How many peer connections a port accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PortCapacity {
    /// At most one connection; connecting replaces the existing one.
    Single,
    /// Any number of connections.
    #[default]
    Multi,
}

/// Typed value stored in a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum PortValue {
    /// No payload.
    #[default]
    None,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i32),
    /// Floating point.
    Float(f32),
    /// 2D vector.
    Vector2([f32; 2]),
    /// 3D vector.
    Vector3([f32; 3]),
    /// Color (RGBA).
    Color([f32; 4]),
    /// Text.
    Text(String),
}

impl PortValue {
    /// Whether two values carry the same kind of payload.
    pub fn same_kind(&self, other: &PortValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A connection endpoint on a flow node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPort {
    /// Unique port ID.
    pub id: PortId,
    /// Owning node ID.
    pub node_id: NodeId,
    /// Port name.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
    /// Connection capacity.
    pub capacity: PortCapacity,
    /// Peer port ids, symmetric with each peer's own list.
    pub connections: Vec<PortId>,
    /// Typed payload.
    pub value: PortValue,
}

impl FlowPort {
    /// Create a new unattached port. The owning node fills in `node_id`
    /// when the port is added.
    pub fn new(name: impl Into<String>, direction: PortDirection, capacity: PortCapacity) -> Self {
        Self {
            id: PortId::new(),
            node_id: NodeId(Uuid::nil()),
            name: name.into(),
            direction,
            capacity,
            connections: Vec::new(),
            value: PortValue::None,
        }
    }

    /// Create an input port.
    pub fn input(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Input, PortCapacity::Multi)
    }

    /// Create an output port.
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(name, PortDirection::Output, PortCapacity::Multi)
    }

    /// Restrict to a single connection.
    pub fn single(mut self) -> Self {
        self.capacity = PortCapacity::Single;
        self
    }

    /// Set the initial payload.
    pub fn with_value(mut self, value: PortValue) -> Self {
        self.value = value;
        self
    }

    /// Whether this is an input port.
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Whether this is an output port.
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Whether this port has any connections.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Whether this port is connected to the given peer.
    pub fn is_connected_to(&self, peer: PortId) -> bool {
        self.connections.contains(&peer)
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Replace the payload if the kinds match. Returns `false` on a kind
    /// mismatch; a port with no payload accepts any kind.
    pub fn set_value(&mut self, value: PortValue) -> bool {
        if self.value == PortValue::None || self.value.same_kind(&value) {
            self.value = value;
            true
        } else {
            false
        }
    }

    /// Check whether a connection to `other` is legal: distinct ports on
    /// different nodes, opposite directions, not already connected.
    pub fn can_connect(&self, other: &FlowPort) -> bool {
        if self.id == other.id {
            return false;
        }
        if self.node_id == other.node_id {
            return false;
        }
        if self.direction == other.direction {
            return false;
        }
        if self.is_connected_to(other.id) || other.is_connected_to(self.id) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_connect_requires_opposite_directions() {
        let mut a = FlowPort::output("out");
        let mut b = FlowPort::output("out");
        a.node_id = NodeId::new();
        b.node_id = NodeId::new();
        assert!(!a.can_connect(&b));

        let mut c = FlowPort::input("in");
        c.node_id = NodeId::new();
        assert!(a.can_connect(&c));
    }

    #[test]
    fn test_can_connect_rejects_same_node() {
        let node = NodeId::new();
        let mut a = FlowPort::output("out");
        let mut b = FlowPort::input("in");
        a.node_id = node;
        b.node_id = node;
        assert!(!a.can_connect(&b));
    }

    #[test]
    fn test_can_connect_rejects_existing_connection() {
        let mut a = FlowPort::output("out");
        let mut b = FlowPort::input("in");
        a.node_id = NodeId::new();
        b.node_id = NodeId::new();
        a.connections.push(b.id);
        assert!(!a.can_connect(&b));
    }

    #[test]
    fn test_set_value_kind_checked() {
        let mut port = FlowPort::input("value").with_value(PortValue::Float(0.0));
        assert!(port.set_value(PortValue::Float(3.5)));
        assert!(!port.set_value(PortValue::Bool(true)));
        assert_eq!(port.value, PortValue::Float(3.5));
    }

    #[test]
    fn test_empty_port_accepts_any_kind() {
        let mut port = FlowPort::input("value");
        assert!(port.set_value(PortValue::Text("hello".to_string())));
    }

    #[test]
    fn test_serialization_round_trip() {
        let port = FlowPort::output("next")
            .single()
            .with_value(PortValue::Vector2([1.0, 2.0]));
        let text = ron::to_string(&port).unwrap();
        let loaded: FlowPort = ron::from_str(&text).unwrap();
        assert_eq!(loaded.id, port.id);
        assert_eq!(loaded.capacity, PortCapacity::Single);
        assert_eq!(loaded.value, port.value);
    }
}
