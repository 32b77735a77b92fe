//! Auto-layout collaborator interface.
//!
//! Layout itself is external: an engine receives coarse node/edge geometry
//! and returns positions. The sync layer invokes it exactly once, on the
//! first successful rebuild, so it never fights the user's manual
//! repositioning afterwards.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node position on the diagram surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Coarse geometry handed to a layout engine.
#[derive(Debug, Clone)]
pub struct NodeGeometry {
    pub id: NodeId,
    pub inputs: usize,
    pub outputs: usize,
}

/// Black-box auto-arrangement of node positions.
pub trait LayoutEngine: Send {
    /// Returns a position per node id. Nodes absent from the result keep
    /// their current position.
    fn arrange(
        &self,
        nodes: &[NodeGeometry],
        edges: &[(NodeId, NodeId)],
    ) -> HashMap<NodeId, Position>;
}
