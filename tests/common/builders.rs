//! Test data builders for pipeline documents and catalogs

use pipevis_rs::catalog::{OperatorCatalog, OperatorDefinition};
use pipevis_rs::graph::PortType;
use pipevis_rs::types::{
    DisplayKind, EdgeEndpoint, EdgeId, NodeId, Params, Pipeline, PipelineEdge, PipelineId,
    PipelineNode,
};
use serde_json::json;

/// Builder for an operator catalog keyed by image name.
#[derive(Default)]
pub struct CatalogBuilder {
    catalog: OperatorCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(
        mut self,
        image: &str,
        inputs: &[(&str, PortType)],
        outputs: &[(&str, PortType)],
    ) -> Self {
        let to_map = |ports: &[(&str, PortType)]| {
            ports
                .iter()
                .map(|(label, ty)| (label.to_string(), json!({"type": ty, "required": true})))
                .collect::<serde_json::Map<_, _>>()
        };
        let definition: OperatorDefinition = serde_json::from_value(json!({
            "name": image,
            "ports": {"input": to_map(inputs), "output": to_map(outputs)},
        }))
        .expect("catalog entry");
        self.catalog.insert(image.to_string(), definition);
        self
    }

    pub fn build(self) -> OperatorCatalog {
        self.catalog
    }
}

/// Builder for a pipeline document.
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            pipeline: Pipeline::empty(PipelineId::from(id)),
        }
    }

    pub fn operator(mut self, id: &str, image: &str) -> Self {
        self.pipeline
            .nodes
            .push(PipelineNode::operator(NodeId::from(id), image, Params::new()));
        self
    }

    pub fn display(mut self, id: &str, kind: DisplayKind) -> Self {
        self.pipeline
            .nodes
            .push(PipelineNode::display(NodeId::from(id), kind));
        self
    }

    pub fn edge(
        mut self,
        id: &str,
        ty: PortType,
        from: (&str, &str),
        to: (&str, &str),
    ) -> Self {
        self.pipeline.edges.push(PipelineEdge {
            id: EdgeId::from(id),
            port_type: ty,
            from: EdgeEndpoint::new(from.0, from.1),
            to: EdgeEndpoint::new(to.0, to.1),
        });
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}
