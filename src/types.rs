//! Pipeline document types for pipevis-rs
//!
//! This module contains the canonical, JSON-serializable document model
//! shared with the server: pipelines, their nodes and edges, and the
//! opaque identifiers that tie them together.
//!
//! # Main Types
//!
//! - [`Pipeline`] - A pipeline document: id plus node and edge sets
//! - [`PipelineNode`] - Operator or display node (internally tagged `type`)
//! - [`PipelineEdge`] - A typed connection between two named ports
//! - [`Display`] - A display instance registered for a display node
//!
//! # Identifiers
//!
//! All identifiers are opaque strings, unique within their scope. New ids
//! for locally created nodes and links are v4 UUIDs. Identifiers are
//! newtyped so a node id cannot be passed where an edge id is expected.
//!
//! # Forward compatibility
//!
//! Documents produced by newer servers may carry fields this client does
//! not know about. Node payloads keep those in an opaque `extra` bucket so
//! a load/store round trip never drops them.

use crate::graph::port::PortType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Parameter map of a node, operator-defined shape.
pub type Params = Map<String, Value>;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh, globally unique id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing fragment used for compact labels.
            pub fn short(&self) -> &str {
                let tail = self
                    .0
                    .char_indices()
                    .rev()
                    .nth(7)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                &self.0[tail..]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identity of a node within a pipeline.
    NodeId
);
string_id!(
    /// Identity of an edge within a pipeline.
    EdgeId
);
string_id!(
    /// Identity of a pipeline document.
    PipelineId
);
string_id!(
    /// Identity of a server session.
    SessionId
);

/// Dimensionality of a display sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayKind {
    #[serde(rename = "1D")]
    OneD,
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayKind::OneD => write!(f, "1D"),
            DisplayKind::TwoD => write!(f, "2D"),
            DisplayKind::ThreeD => write!(f, "3D"),
        }
    }
}

/// A node of a pipeline document.
///
/// Operator nodes reference an image in the operator catalog; display
/// nodes reference a display kind. Both carry an operator-defined
/// parameter map, and unknown fields are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineNode {
    Operator {
        id: NodeId,
        image: String,
        #[serde(default)]
        params: Params,
        #[serde(flatten)]
        extra: Params,
    },
    Display {
        id: NodeId,
        #[serde(rename = "display")]
        kind: DisplayKind,
        #[serde(default)]
        params: Params,
        #[serde(flatten)]
        extra: Params,
    },
}

impl PipelineNode {
    pub fn operator(id: NodeId, image: impl Into<String>, params: Params) -> Self {
        PipelineNode::Operator {
            id,
            image: image.into(),
            params,
            extra: Params::new(),
        }
    }

    pub fn display(id: NodeId, kind: DisplayKind) -> Self {
        PipelineNode::Display {
            id,
            kind,
            params: Params::new(),
            extra: Params::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        match self {
            PipelineNode::Operator { id, .. } | PipelineNode::Display { id, .. } => id,
        }
    }

    pub fn params(&self) -> &Params {
        match self {
            PipelineNode::Operator { params, .. } | PipelineNode::Display { params, .. } => params,
        }
    }

    pub fn is_display(&self) -> bool {
        matches!(self, PipelineNode::Display { .. })
    }

    pub fn display_kind(&self) -> Option<DisplayKind> {
        match self {
            PipelineNode::Display { kind, .. } => Some(*kind),
            PipelineNode::Operator { .. } => None,
        }
    }

    /// Human-readable label shown on the diagram surface.
    pub fn label(&self) -> String {
        match self {
            PipelineNode::Operator { id, image, .. } => format!("{} - {}", id.short(), image),
            PipelineNode::Display { id, kind, .. } => {
                format!("{} - Display ({})", id.short(), kind)
            }
        }
    }
}

/// One endpoint of an edge: a node and a port label on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    pub id: NodeId,
    pub port: String,
}

impl EdgeEndpoint {
    pub fn new(id: impl Into<NodeId>, port: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            port: port.into(),
        }
    }
}

/// A typed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEdge {
    pub id: EdgeId,
    #[serde(rename = "type")]
    pub port_type: PortType,
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
}

/// A pipeline document. Node and edge order carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    #[serde(default)]
    pub nodes: Vec<PipelineNode>,
    #[serde(default)]
    pub edges: Vec<PipelineEdge>,
}

impl Pipeline {
    pub fn empty(id: impl Into<PipelineId>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&PipelineNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }
}

/// A display instance, keyed by the id of its display node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: DisplayKind,
}
