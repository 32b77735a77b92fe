//! # PipeVis-RS: Visual Pipeline Editor Core
//!
//! The client-side core of a visual pipeline composer: users wire data
//! processing operators and display sinks into a directed graph, the graph
//! stays in lockstep with a canonical pipeline document, and live results
//! stream back from the backend into display widgets over a persistent
//! connection.
//!
//! ## Architecture
//!
//! - **Graph**: port-typed node/edge model rebuilt from the document on
//!   every change, plus the sync layer translating diagram surface events
//!   into document patches
//! - **Notify**: MessagePack frame decoding and the notification
//!   multiplexer fanning envelopes out by action type and display id
//! - **Client**: the pipeline submit seam with bounded-concurrency
//!   admission
//! - **Session**: explicit ownership of one transport, one multiplexer
//!   and one submit path, with explicit teardown
//!
//! Rendering, HTTP transport and the entity store are collaborators, not
//! residents: this crate exposes plain value types and typed events so it
//! can sit behind any widget toolkit.
//!
//! ## Example
//!
//! ```ignore
//! use pipevis_rs::{
//!     client::Throttled,
//!     graph::{DiagramSync, SurfaceEvent},
//!     notify::FrameDecoder,
//!     session::Session,
//!     types::SessionId,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(frames: tokio::sync::mpsc::Receiver<bytes::Bytes>,
//! #              api: Arc<dyn pipevis_rs::client::PipelineService>,
//! #              document: pipevis_rs::types::Pipeline,
//! #              catalog: pipevis_rs::catalog::OperatorCatalog) {
//! let session = Session::start(
//!     SessionId::from("s1"),
//!     FrameDecoder::tagged(),
//!     frames,
//!     api,
//! );
//!
//! let mut sync = DiagramSync::new(document, catalog, None);
//! // surface events in, document patches out
//! let patches = sync.handle_event(SurfaceEvent::LinkRemoved {
//!     link_id: "l1".into(),
//! });
//!
//! let display = session.open_display("disp-1".into());
//! display.subscribe(pipevis_rs::notify::DISPLAY_RENDER, |envelope| {
//!     // repaint from envelope.payload
//! });
//!
//! session.shutdown().await;
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod notify;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use catalog::{OperatorCatalog, OperatorDefinition};
pub use client::{PipelineService, Throttled};
pub use config::CanvasState;
pub use error::{PipevisError, Result};
pub use graph::{DiagramSync, DocPatch, GraphError, GraphModel, Port, PortType, SurfaceEvent};
pub use notify::{
    DisplayChannel, DisplayEvent, FrameDecoder, NotificationEnvelope, NotificationMultiplexer,
};
pub use session::Session;
pub use types::{
    Display, DisplayKind, EdgeId, NodeId, Pipeline, PipelineEdge, PipelineId, PipelineNode,
    SessionId,
};
