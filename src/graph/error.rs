//! Graph-specific error types.

use crate::graph::port::PortType;
use crate::types::{EdgeId, NodeId};
use thiserror::Error;

/// Errors that can occur while mutating the pipeline graph.
///
/// All of these are recoverable: the caller drops the offending mutation
/// and the model is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("edge {edge} references unknown port {port} on node {node}")]
    UnknownEndpoint {
        edge: EdgeId,
        node: NodeId,
        port: String,
    },

    #[error("incompatible ports: {from} ({from_type}) -> {to} ({to_type})")]
    IncompatiblePorts {
        from: String,
        to: String,
        from_type: PortType,
        to_type: PortType,
    },

    #[error("input port {port} on node {node} already has an incoming edge")]
    PortCapacityExceeded { node: NodeId, port: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
