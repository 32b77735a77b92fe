//! Typed port identity and compatibility rules.
//!
//! Ports are the only place connectivity is decided: two ports may be
//! linked iff their directions differ and their types are equal. Port ids
//! are derived deterministically from direction and label so a port
//! re-created from an operator's declared port list resolves to the same
//! identity across rebuilds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of data flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    /// Array/tensor data exchanged between operators.
    Data,
    /// Renderable values bound for a display sink.
    Display,
    /// Opaque byte streams.
    Binary,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::Data => write!(f, "data"),
            PortType::Display => write!(f, "display"),
            PortType::Binary => write!(f, "binary"),
        }
    }
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    In,
    Out,
}

/// Deterministic port id: the same logical port always derives the same
/// identity (`in://<label>` / `out://<label>`).
pub fn port_id(direction: PortDirection, label: &str) -> String {
    match direction {
        PortDirection::In => format!("in://{label}"),
        PortDirection::Out => format!("out://{label}"),
    }
}

/// A typed, directional connection point owned by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub direction: PortDirection,
    pub label: String,
    pub port_type: PortType,
}

impl Port {
    pub fn input(label: impl Into<String>, port_type: PortType) -> Self {
        Self {
            direction: PortDirection::In,
            label: label.into(),
            port_type,
        }
    }

    pub fn output(label: impl Into<String>, port_type: PortType) -> Self {
        Self {
            direction: PortDirection::Out,
            label: label.into(),
            port_type,
        }
    }

    pub fn id(&self) -> String {
        port_id(self.direction, &self.label)
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::In
    }
}

/// The single connectivity rule: directions differ, types match.
pub fn compatible(a: &Port, b: &Port) -> bool {
    a.direction != b.direction && a.port_type == b.port_type
}
