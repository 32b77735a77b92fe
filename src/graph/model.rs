//! Canonical in-memory graph derived from a pipeline document.
//!
//! The document is the single source of truth; this model is a disposable
//! projection of it, rebuilt wholesale on every document change rather
//! than patched incrementally. The model is the sole owner of node, port
//! and edge state and is the only place the connectivity invariants are
//! enforced:
//!
//! - two ports link iff their directions differ and their types are equal
//! - an input port holds at most one incoming edge
//! - every edge endpoint resolves to a port on a node in the same pipeline

use crate::catalog::{self, OperatorCatalog};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::port::{compatible, port_id, Port, PortDirection};
use crate::types::{EdgeId, NodeId, Pipeline, PipelineEdge, PipelineId, PipelineNode};
use std::collections::HashMap;

/// A node plus the ports it owns, keyed by derived port id.
#[derive(Debug, Clone)]
pub struct GraphNode {
    node: PipelineNode,
    ports: HashMap<String, Port>,
}

impl GraphNode {
    fn new(node: PipelineNode, declarations: Vec<Port>) -> Self {
        let mut ports = HashMap::with_capacity(declarations.len());
        for port in declarations {
            ports.insert(port.id(), port);
        }
        Self { node, ports }
    }

    pub fn id(&self) -> &NodeId {
        self.node.id()
    }

    pub fn document_node(&self) -> &PipelineNode {
        &self.node
    }

    pub fn port(&self, direction: PortDirection, label: &str) -> Option<&Port> {
        self.ports.get(&port_id(direction, label))
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Adds the port if no port with the same derived id exists yet.
    /// Existing declarations always win over edge-synthesized ports.
    fn ensure_port(&mut self, port: Port) {
        self.ports.entry(port.id()).or_insert(port);
    }
}

/// Node/port/edge storage with id-based lookup.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: HashMap<NodeId, GraphNode>,
    edges: HashMap<EdgeId, PipelineEdge>,
    /// Single-slot occupancy of input ports: (node, port id) -> edge.
    inbound: HashMap<(NodeId, String), EdgeId>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a node together with its declared ports.
    pub fn add_node(&mut self, node: PipelineNode, declarations: Vec<Port>) -> GraphResult<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(GraphError::DuplicateNode(node.id().clone()));
        }
        let id = node.id().clone();
        self.nodes.insert(id, GraphNode::new(node, declarations));
        Ok(())
    }

    /// Removes a node and cascades removal of every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) {
        if self.nodes.remove(id).is_none() {
            return;
        }
        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| &e.from.id == id || &e.to.id == id)
            .map(|e| e.id.clone())
            .collect();
        for edge_id in touching {
            self.remove_edge(&edge_id);
        }
    }

    /// Validates and inserts an edge.
    ///
    /// Insertion is an idempotent upsert: an edge with the same id replaces
    /// the previous one. An input port occupied by a *different* edge fails
    /// with [`GraphError::PortCapacityExceeded`]. On any failure the model
    /// is left unchanged.
    pub fn add_edge(&mut self, edge: PipelineEdge) -> GraphResult<()> {
        let from_port = self
            .resolve(&edge.from.id, PortDirection::Out, &edge.from.port)
            .ok_or_else(|| GraphError::UnknownEndpoint {
                edge: edge.id.clone(),
                node: edge.from.id.clone(),
                port: port_id(PortDirection::Out, &edge.from.port),
            })?
            .clone();
        let to_port = self
            .resolve(&edge.to.id, PortDirection::In, &edge.to.port)
            .ok_or_else(|| GraphError::UnknownEndpoint {
                edge: edge.id.clone(),
                node: edge.to.id.clone(),
                port: port_id(PortDirection::In, &edge.to.port),
            })?
            .clone();

        if !compatible(&from_port, &to_port) {
            return Err(GraphError::IncompatiblePorts {
                from: from_port.id(),
                to: to_port.id(),
                from_type: from_port.port_type,
                to_type: to_port.port_type,
            });
        }

        let slot = (edge.to.id.clone(), to_port.id());
        if let Some(occupant) = self.inbound.get(&slot) {
            if *occupant != edge.id {
                return Err(GraphError::PortCapacityExceeded {
                    node: edge.to.id.clone(),
                    port: to_port.id(),
                });
            }
        }

        // Past all checks; free the slot held by a prior version of this edge
        // (it may target a different input port) before inserting.
        if let Some(prior) = self.edges.remove(&edge.id) {
            self.inbound
                .remove(&(prior.to.id.clone(), port_id(PortDirection::In, &prior.to.port)));
        }
        self.inbound.insert(slot, edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Removes an edge if present; a no-op otherwise.
    pub fn remove_edge(&mut self, id: &EdgeId) {
        if let Some(edge) = self.edges.remove(id) {
            self.inbound
                .remove(&(edge.to.id.clone(), port_id(PortDirection::In, &edge.to.port)));
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_port(&self, node: &NodeId, direction: PortDirection, label: &str) -> Option<&Port> {
        self.nodes.get(node)?.port(direction, label)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&PipelineEdge> {
        self.edges.get(id)
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// The edge currently occupying an input port, if any.
    pub fn incoming_edge(&self, node: &NodeId, label: &str) -> Option<&EdgeId> {
        self.inbound
            .get(&(node.clone(), port_id(PortDirection::In, label)))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &PipelineEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn resolve(&self, node: &NodeId, direction: PortDirection, label: &str) -> Option<&Port> {
        self.nodes.get(node)?.port(direction, label)
    }

    /// Deterministic, pure reconstruction of the whole graph from a
    /// pipeline document.
    ///
    /// Ports come from catalog declarations; a port referenced only by an
    /// edge is synthesized with the edge's type, as the diagram surface
    /// does when reloading a document drawn against an older catalog.
    /// Edges that fail validation are dropped silently: a stale or
    /// mismatched edge must never take the session down.
    pub fn rebuild(document: &Pipeline, catalog: &OperatorCatalog) -> Self {
        let mut model = GraphModel::new();

        for node in &document.nodes {
            let declarations = catalog::node_ports(node, catalog);
            if let Err(err) = model.add_node(node.clone(), declarations) {
                tracing::debug!(node = %node.id(), %err, "dropping node during rebuild");
            }
        }

        for edge in &document.edges {
            if let Some(node) = model.nodes.get_mut(&edge.from.id) {
                node.ensure_port(Port::output(edge.from.port.clone(), edge.port_type));
            }
            if let Some(node) = model.nodes.get_mut(&edge.to.id) {
                node.ensure_port(Port::input(edge.to.port.clone(), edge.port_type));
            }
            if let Err(err) = model.add_edge(edge.clone()) {
                tracing::debug!(edge = %edge.id, %err, "dropping edge during rebuild");
            }
        }

        model
    }

    /// Serializes the model back into a document. Nodes and edges are
    /// emitted in id order so equal models produce equal documents.
    pub fn to_document(&self, id: impl Into<PipelineId>) -> Pipeline {
        let mut nodes: Vec<PipelineNode> = self
            .nodes
            .values()
            .map(|n| n.document_node().clone())
            .collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));

        let mut edges: Vec<PipelineEdge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        Pipeline {
            id: id.into(),
            nodes,
            edges,
        }
    }
}
