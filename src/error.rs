//! Error handling for pipevis-rs.
//!
//! Every error in this crate is recoverable by design: a malformed frame,
//! a stale edge event or a rejected mutation must never take down an
//! otherwise-live visual session. The only fatal condition, loss of the
//! transport itself, belongs to the transport collaborator.

use thiserror::Error;

/// Main error type for pipevis-rs operations.
#[derive(Error, Debug)]
pub enum PipevisError {
    /// A rejected pipeline graph mutation.
    #[error("graph error: {0}")]
    Graph(#[from] crate::graph::error::GraphError),

    /// A notification frame that could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] crate::notify::frame::DecodeError),

    /// Channel communication failure.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration loading/saving failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure reported by the pipeline submit collaborator.
    #[error("service error: {0}")]
    Service(String),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipevis-rs operations.
pub type Result<T> = std::result::Result<T, PipevisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::error::GraphError;
    use crate::types::NodeId;

    #[test]
    fn test_graph_error_display() {
        let err = PipevisError::from(GraphError::DuplicateNode(NodeId::from("op1")));
        assert_eq!(err.to_string(), "graph error: duplicate node id op1");
    }

    #[test]
    fn test_config_error_display() {
        let err = PipevisError::Config("no data directory".to_string());
        assert!(err.to_string().contains("no data directory"));
    }
}
