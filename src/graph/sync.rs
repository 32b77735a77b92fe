//! Two-way bridge between an interactive diagram surface and the graph.
//!
//! Surface interactions arrive as a typed [`SurfaceEvent`] stream and are
//! processed synchronously by [`DiagramSync::handle_event`], which returns
//! the [`DocPatch`]es the external store should apply to the canonical
//! pipeline document. The store then feeds the changed document back in as
//! a [`SurfaceEvent::DocumentChanged`], which rebuilds the whole model.
//!
//! ```text
//! surface event ──► DiagramSync ──► DocPatch ──► store
//!                        ▲                         │
//!                        └──── DocumentChanged ────┘
//! ```
//!
//! The sync layer never owns graph data. It keeps only a display-position
//! overlay keyed by node id; positions survive a rebuild by id matching.

use crate::catalog::OperatorCatalog;
use crate::graph::layout::{LayoutEngine, NodeGeometry, Position};
use crate::graph::model::GraphModel;
use crate::graph::port::PortDirection;
use crate::types::{
    Display, DisplayKind, EdgeEndpoint, EdgeId, NodeId, Pipeline, PipelineEdge, PipelineId,
    PipelineNode,
};
use serde::Deserialize;
use std::collections::HashMap;

/// One endpoint of a link as the surface sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEndpoint {
    pub node: NodeId,
    pub port: String,
}

impl SurfaceEndpoint {
    pub fn new(node: impl Into<NodeId>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

/// A link as drawn on the surface. Endpoints are optional because a link
/// being dragged has only one of them attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLink {
    pub id: EdgeId,
    pub from: Option<SurfaceEndpoint>,
    pub to: Option<SurfaceEndpoint>,
}

/// Everything the diagram surface can report.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A link was drawn. Its target is usually still unattached, so no
    /// canonical edge is derived yet.
    LinkCreated { link: SurfaceLink },
    /// An endpoint of an existing link changed (drag onto a port).
    LinkRetargeted { link: SurfaceLink },
    /// A link was removed from the surface.
    LinkRemoved { link_id: EdgeId },
    /// A palette item was dropped onto empty canvas space.
    NodeDropped { payload: String, position: Position },
    /// The user moved a node.
    NodeMoved { node_id: NodeId, position: Position },
    /// The canonical document changed; rebuild the model.
    DocumentChanged { pipeline: Pipeline },
}

/// Canonical changes for the external store to apply to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocPatch {
    UpsertEdge {
        pipeline_id: PipelineId,
        edge: PipelineEdge,
    },
    RemoveEdge {
        pipeline_id: PipelineId,
        edge_id: EdgeId,
    },
    SetPipeline(Pipeline),
    SetDisplay(Display),
}

/// Payload of a palette drop, as serialized by the palette widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DropPayload {
    Operator {
        #[serde(rename = "imageName")]
        image_name: String,
        operator: crate::catalog::OperatorDefinition,
    },
    Display {
        #[serde(rename = "displayType")]
        display_type: DisplayKind,
    },
}

/// Keeps the diagram surface and the canonical document in lockstep.
pub struct DiagramSync {
    document: Pipeline,
    catalog: OperatorCatalog,
    model: GraphModel,
    positions: HashMap<NodeId, Position>,
    layout: Option<Box<dyn LayoutEngine>>,
    first_layout_done: bool,
}

impl DiagramSync {
    pub fn new(
        document: Pipeline,
        catalog: OperatorCatalog,
        layout: Option<Box<dyn LayoutEngine>>,
    ) -> Self {
        let mut sync = Self {
            document: Pipeline::empty(document.id.clone()),
            catalog,
            model: GraphModel::new(),
            positions: HashMap::new(),
            layout,
            first_layout_done: false,
        };
        sync.apply_document(document);
        sync
    }

    pub fn document(&self) -> &Pipeline {
        &self.document
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn positions(&self) -> &HashMap<NodeId, Position> {
        &self.positions
    }

    /// Replaces the catalog and re-derives the model from the current
    /// document.
    pub fn set_catalog(&mut self, catalog: OperatorCatalog) {
        self.catalog = catalog;
        let document = self.document.clone();
        self.apply_document(document);
    }

    /// Processes one surface event and returns the document patches it
    /// implies. Events referencing graph state that no longer resolves
    /// (a race with a concurrent rebuild) are ignored.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> Vec<DocPatch> {
        match event {
            // The canonical edge is derived once the target attaches.
            SurfaceEvent::LinkCreated { .. } => Vec::new(),
            SurfaceEvent::LinkRetargeted { link } => self.link_retargeted(link),
            SurfaceEvent::LinkRemoved { link_id } => vec![DocPatch::RemoveEdge {
                pipeline_id: self.document.id.clone(),
                edge_id: link_id,
            }],
            SurfaceEvent::NodeDropped { payload, position } => {
                self.node_dropped(&payload, position)
            }
            SurfaceEvent::NodeMoved { node_id, position } => {
                self.positions.insert(node_id, position);
                Vec::new()
            }
            SurfaceEvent::DocumentChanged { pipeline } => {
                self.apply_document(pipeline);
                Vec::new()
            }
        }
    }

    /// Rebuilds the model from a document, carrying node positions forward
    /// by id. The external layout engine runs once, after the first
    /// rebuild only.
    pub fn apply_document(&mut self, document: Pipeline) {
        let model = GraphModel::rebuild(&document, &self.catalog);
        self.positions.retain(|id, _| model.contains_node(id));
        self.model = model;
        self.document = document;

        if !self.first_layout_done {
            self.first_layout_done = true;
            self.auto_arrange();
        }
    }

    fn auto_arrange(&mut self) {
        let Some(engine) = &self.layout else {
            return;
        };
        let nodes: Vec<NodeGeometry> = self
            .model
            .nodes()
            .map(|n| NodeGeometry {
                id: n.id().clone(),
                inputs: n.ports().filter(|p| p.is_input()).count(),
                outputs: n.ports().filter(|p| !p.is_input()).count(),
            })
            .collect();
        let edges: Vec<(NodeId, NodeId)> = self
            .model
            .edges()
            .map(|e| (e.from.id.clone(), e.to.id.clone()))
            .collect();
        for (id, position) in engine.arrange(&nodes, &edges) {
            self.positions.insert(id, position);
        }
    }

    fn link_retargeted(&mut self, link: SurfaceLink) -> Vec<DocPatch> {
        let (Some(from), Some(to)) = (link.from, link.to) else {
            return Vec::new();
        };
        let Some(from_port) = self.model.get_port(&from.node, PortDirection::Out, &from.port)
        else {
            return Vec::new();
        };
        let Some(to_port) = self.model.get_port(&to.node, PortDirection::In, &to.port) else {
            return Vec::new();
        };

        // A drag can transiently land on a port of another type. The
        // invalid edge is deleted rather than propagated.
        if from_port.port_type != to_port.port_type {
            return vec![DocPatch::RemoveEdge {
                pipeline_id: self.document.id.clone(),
                edge_id: link.id,
            }];
        }

        let edge = PipelineEdge {
            id: link.id,
            port_type: from_port.port_type,
            from: EdgeEndpoint {
                id: from.node,
                port: from.port,
            },
            to: EdgeEndpoint {
                id: to.node,
                port: to.port,
            },
        };
        vec![DocPatch::UpsertEdge {
            pipeline_id: self.document.id.clone(),
            edge,
        }]
    }

    fn node_dropped(&mut self, payload: &str, position: Position) -> Vec<DocPatch> {
        let payload: DropPayload = match serde_json::from_str(payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed drop payload");
                return Vec::new();
            }
        };

        match payload {
            DropPayload::Operator {
                image_name,
                operator,
            } => {
                let node = PipelineNode::operator(
                    NodeId::generate(),
                    image_name,
                    operator.default_params(),
                );
                self.positions.insert(node.id().clone(), position);
                let mut next = self.document.clone();
                next.nodes.push(node);
                vec![DocPatch::SetPipeline(next)]
            }
            DropPayload::Display { display_type } => {
                let id = NodeId::generate();
                self.positions.insert(id.clone(), position);
                let mut next = self.document.clone();
                next.nodes
                    .push(PipelineNode::display(id.clone(), display_type));
                vec![
                    DocPatch::SetPipeline(next),
                    DocPatch::SetDisplay(Display {
                        id,
                        kind: display_type,
                    }),
                ]
            }
        }
    }
}
