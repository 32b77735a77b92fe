//! Operator catalog types.
//!
//! The catalog maps operator image names to their declared ports and
//! parameters. It is fetched from the server and consumed read-only: port
//! declarations seed graph nodes, parameter defaults seed newly dropped
//! operators.

use crate::graph::port::{Port, PortType};
use crate::types::{Params, PipelineNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Declared type of a single operator port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default)]
    pub required: bool,
}

/// An operator's declared input and output ports, keyed by label.
///
/// `BTreeMap` keeps declaration order stable so ports derive the same way
/// on every rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortsSpec {
    #[serde(default)]
    pub input: BTreeMap<String, PortSpec>,
    #[serde(default)]
    pub output: BTreeMap<String, PortSpec>,
}

/// Declared shape of a single operator parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Catalog entry for one operator image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDefinition {
    pub name: String,
    #[serde(default)]
    pub ports: PortsSpec,
    #[serde(default)]
    pub params: BTreeMap<String, ParamSpec>,
}

impl OperatorDefinition {
    /// Port declarations for a node backed by this operator.
    pub fn port_declarations(&self) -> Vec<Port> {
        let mut ports = Vec::with_capacity(self.ports.input.len() + self.ports.output.len());
        for (label, spec) in &self.ports.input {
            ports.push(Port::input(label.clone(), spec.port_type));
        }
        for (label, spec) in &self.ports.output {
            ports.push(Port::output(label.clone(), spec.port_type));
        }
        ports
    }

    /// Parameter map seeded with the declared defaults.
    pub fn default_params(&self) -> Params {
        let mut params = Params::new();
        for (key, spec) in &self.params {
            params.insert(
                key.clone(),
                spec.default.clone().unwrap_or(Value::Null),
            );
        }
        params
    }
}

/// Mapping from operator image name to its definition.
pub type OperatorCatalog = HashMap<String, OperatorDefinition>;

/// Port declarations for a document node.
///
/// Operator nodes take their ports from the catalog (none when the image
/// is unknown; rebuild synthesizes ports from edges in that case).
/// Display nodes carry a single fixed display input.
pub fn node_ports(node: &PipelineNode, catalog: &OperatorCatalog) -> Vec<Port> {
    match node {
        PipelineNode::Operator { image, .. } => catalog
            .get(image)
            .map(OperatorDefinition::port_declarations)
            .unwrap_or_default(),
        PipelineNode::Display { .. } => vec![Port::input("in", PortType::Display)],
    }
}
