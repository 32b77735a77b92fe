//! Rebuild and round-trip behavior of the graph model and sync layer.

mod common;

use common::builders::{CatalogBuilder, PipelineBuilder};
use pipevis_rs::graph::{
    DiagramSync, GraphModel, LayoutEngine, NodeGeometry, Position, PortType, SurfaceEvent,
};
use pipevis_rs::types::{DisplayKind, NodeId, Pipeline};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn catalog() -> pipevis_rs::OperatorCatalog {
    CatalogBuilder::new()
        .operator("img/reader", &[], &[("result", PortType::Data)])
        .operator(
            "img/blur",
            &[("image", PortType::Data)],
            &[("result", PortType::Data), ("view", PortType::Display)],
        )
        .build()
}

fn document() -> Pipeline {
    PipelineBuilder::new("p1")
        .operator("reader", "img/reader")
        .operator("blur", "img/blur")
        .display("disp", DisplayKind::TwoD)
        .edge("e1", PortType::Data, ("reader", "result"), ("blur", "image"))
        .edge("e2", PortType::Display, ("blur", "view"), ("disp", "in"))
        .build()
}

fn node_ids(model: &GraphModel) -> BTreeSet<String> {
    model.nodes().map(|n| n.id().as_str().to_string()).collect()
}

fn edge_ids(model: &GraphModel) -> BTreeSet<String> {
    model.edges().map(|e| e.id.as_str().to_string()).collect()
}

#[test]
fn test_rebuild_is_idempotent() {
    let doc = document();
    let catalog = catalog();
    let first = GraphModel::rebuild(&doc, &catalog);
    let second = GraphModel::rebuild(&doc, &catalog);

    assert_eq!(node_ids(&first), node_ids(&second));
    assert_eq!(edge_ids(&first), edge_ids(&second));
    assert_eq!(first.edge_count(), 2);
}

#[test]
fn test_incompatible_document_edge_is_dropped_silently() {
    let doc = PipelineBuilder::new("p1")
        .operator("reader", "img/reader")
        .operator("blur", "img/blur")
        .display("disp", DisplayKind::OneD)
        // data output into the display-typed input of the display node
        .edge("bad", PortType::Data, ("reader", "result"), ("disp", "in"))
        .edge("good", PortType::Data, ("reader", "result"), ("blur", "image"))
        .build();

    let model = GraphModel::rebuild(&doc, &catalog());
    assert_eq!(edge_ids(&model), BTreeSet::from(["good".to_string()]));
}

#[test]
fn test_edge_only_ports_are_synthesized() {
    // The operator image is unknown to the catalog; its ports exist only
    // because edges reference them, typed after the edge.
    let doc = PipelineBuilder::new("p1")
        .operator("legacy", "img/not-in-catalog")
        .operator("blur", "img/blur")
        .edge("e1", PortType::Data, ("legacy", "out"), ("blur", "image"))
        .build();

    let model = GraphModel::rebuild(&doc, &catalog());
    assert_eq!(model.edge_count(), 1);
    let port = model
        .get_port(
            &NodeId::from("legacy"),
            pipevis_rs::graph::PortDirection::Out,
            "out",
        )
        .expect("synthesized port");
    assert_eq!(port.port_type, PortType::Data);
}

#[test]
fn test_document_round_trips_independent_of_insertion_order() {
    let forward = document();
    let mut reversed = document();
    reversed.nodes.reverse();
    reversed.edges.reverse();

    let catalog = catalog();
    let a = GraphModel::rebuild(&forward, &catalog).to_document("p1");
    let b = GraphModel::rebuild(&reversed, &catalog).to_document("p1");
    assert_eq!(a, b);

    // Endpoint tuples survive the round trip.
    let original: BTreeSet<_> = forward
        .edges
        .iter()
        .map(|e| (e.id.clone(), e.from.clone(), e.to.clone()))
        .collect();
    let rebuilt: BTreeSet<_> = a
        .edges
        .iter()
        .map(|e| (e.id.clone(), e.from.clone(), e.to.clone()))
        .collect();
    assert_eq!(original, rebuilt);
}

#[test]
fn test_positions_round_trip_across_rebuild() {
    let mut sync = DiagramSync::new(document(), catalog(), None);
    sync.handle_event(SurfaceEvent::NodeMoved {
        node_id: NodeId::from("blur"),
        position: Position::new(120.0, 40.0),
    });

    // Same document again: position carried forward unchanged.
    sync.handle_event(SurfaceEvent::DocumentChanged {
        pipeline: document(),
    });
    assert_eq!(
        sync.position(&NodeId::from("blur")),
        Some(Position::new(120.0, 40.0))
    );

    // A document without the node discards its overlay entry.
    let smaller = PipelineBuilder::new("p1")
        .operator("reader", "img/reader")
        .build();
    sync.handle_event(SurfaceEvent::DocumentChanged { pipeline: smaller });
    assert_eq!(sync.position(&NodeId::from("blur")), None);
}

struct CountingLayout {
    calls: Arc<AtomicUsize>,
}

impl LayoutEngine for CountingLayout {
    fn arrange(
        &self,
        nodes: &[NodeGeometry],
        _edges: &[(NodeId, NodeId)],
    ) -> HashMap<NodeId, Position> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), Position::new(i as f64 * 100.0, 0.0)))
            .collect()
    }
}

#[test]
fn test_auto_layout_runs_on_first_rebuild_only() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layout = CountingLayout {
        calls: calls.clone(),
    };
    let mut sync = DiagramSync::new(document(), catalog(), Some(Box::new(layout)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sync.position(&NodeId::from("reader")).is_some());

    // The user repositions a node; later rebuilds must not fight it.
    sync.handle_event(SurfaceEvent::NodeMoved {
        node_id: NodeId::from("reader"),
        position: Position::new(7.0, 7.0),
    });
    sync.handle_event(SurfaceEvent::DocumentChanged {
        pipeline: document(),
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        sync.position(&NodeId::from("reader")),
        Some(Position::new(7.0, 7.0))
    );
}

mod properties {
    use super::*;
    use pipevis_rs::graph::{GraphError, Port};
    use pipevis_rs::types::{EdgeEndpoint, EdgeId, Params, PipelineEdge, PipelineNode};
    use proptest::prelude::*;

    fn port_types() -> impl Strategy<Value = PortType> {
        prop_oneof![
            Just(PortType::Data),
            Just(PortType::Display),
            Just(PortType::Binary),
        ]
    }

    proptest! {
        /// add_edge succeeds iff the directions differ (out -> in, by
        /// construction here) and the port types are equal; on failure the
        /// model is unchanged.
        #[test]
        fn add_edge_succeeds_iff_types_match(from_type in port_types(), to_type in port_types()) {
            let mut model = GraphModel::new();
            model
                .add_node(
                    PipelineNode::operator(NodeId::from("src"), "img/src", Params::new()),
                    vec![Port::output("result", from_type)],
                )
                .unwrap();
            model
                .add_node(
                    PipelineNode::operator(NodeId::from("dst"), "img/dst", Params::new()),
                    vec![Port::input("in", to_type)],
                )
                .unwrap();

            let edge = PipelineEdge {
                id: EdgeId::from("e1"),
                port_type: from_type,
                from: EdgeEndpoint::new("src", "result"),
                to: EdgeEndpoint::new("dst", "in"),
            };
            let result = model.add_edge(edge);

            if from_type == to_type {
                prop_assert!(result.is_ok());
                prop_assert_eq!(model.edge_count(), 1);
            } else {
                prop_assert!(
                    matches!(result, Err(GraphError::IncompatiblePorts { .. })),
                    "expected IncompatiblePorts error"
                );
                prop_assert_eq!(model.edge_count(), 0);
            }
        }

        /// Two rebuilds of the same randomly-shuffled document agree.
        #[test]
        fn rebuild_ignores_document_order(seed in any::<u64>()) {
            let mut doc = document();
            // cheap deterministic shuffle
            let n = doc.nodes.len();
            doc.nodes.rotate_left((seed as usize) % n.max(1));
            let e = doc.edges.len();
            doc.edges.rotate_left((seed as usize) % e.max(1));

            let catalog = catalog();
            let shuffled = GraphModel::rebuild(&doc, &catalog).to_document("p1");
            let reference = GraphModel::rebuild(&document(), &catalog).to_document("p1");
            prop_assert_eq!(shuffled, reference);
        }
    }
}
