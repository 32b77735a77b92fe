//! Pipeline graph model with port-typed edge synchronization.
//!
//! The canonical document flows one way, surface interactions the other:
//!
//! ```text
//! document ──rebuild──► [GraphModel] ◄──events── diagram surface
//!                            │
//!                            └──► DocPatch (edge upsert/remove, set pipeline)
//! ```
//!
//! # Design
//!
//! - **Composition over inheritance** - plain [`Port`]/[`GraphModel`] value
//!   types; adapting to a concrete diagram widget library is the caller's
//!   concern.
//! - **Document is the source of truth** - every change rebuilds the model
//!   from scratch; the in-memory graph is a derived, disposable projection.
//! - **Typed events** - surface interactions are a [`SurfaceEvent`] tagged
//!   union processed synchronously, so the whole layer unit-tests without
//!   a widget toolkit.

pub mod bridge;
pub mod error;
pub mod layout;
pub mod model;
pub mod port;
pub mod sync;

pub use bridge::{run_sync_loop, SurfaceBridge};
pub use error::{GraphError, GraphResult};
pub use layout::{LayoutEngine, NodeGeometry, Position};
pub use model::{GraphModel, GraphNode};
pub use port::{compatible, port_id, Port, PortDirection, PortType};
pub use sync::{DiagramSync, DocPatch, DropPayload, SurfaceEndpoint, SurfaceEvent, SurfaceLink};
