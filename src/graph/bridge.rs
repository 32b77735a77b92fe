//! Thread boundary between a diagram surface and the sync loop.
//!
//! UIs that render the diagram surface on their own thread talk to
//! [`DiagramSync`](crate::graph::sync::DiagramSync) through a
//! `SurfaceBridge`: surface events go in, document patches come out.

use crate::graph::sync::{DiagramSync, DocPatch, SurfaceEvent};
use crate::graph::layout::Position;
use crate::types::{EdgeId, NodeId, Pipeline};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Channel capacity for surface events (UI -> sync).
const EVENT_CHANNEL_CAPACITY: usize = 256;
/// Channel capacity for document patches (sync -> UI/store).
const PATCH_CHANNEL_CAPACITY: usize = 1024;

/// UI-side handle for feeding the sync loop.
pub struct SurfaceBridge {
    pub event_tx: Sender<SurfaceEvent>,
    pub patch_rx: Receiver<DocPatch>,
}

impl SurfaceBridge {
    /// Create a new bridge pair: `(bridge_for_ui, event_rx, patch_tx)`.
    ///
    /// The sync loop owns `event_rx` and `patch_tx`.
    pub fn new() -> (Self, Receiver<SurfaceEvent>, Sender<DocPatch>) {
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        let (patch_tx, patch_rx) = bounded(PATCH_CHANNEL_CAPACITY);
        (Self { event_tx, patch_rx }, event_rx, patch_tx)
    }

    pub fn send_event(&self, event: SurfaceEvent) -> bool {
        self.event_tx.send(event).is_ok()
    }

    pub fn document_changed(&self, pipeline: Pipeline) {
        let _ = self.event_tx.send(SurfaceEvent::DocumentChanged { pipeline });
    }

    pub fn link_removed(&self, link_id: EdgeId) {
        let _ = self.event_tx.send(SurfaceEvent::LinkRemoved { link_id });
    }

    pub fn node_moved(&self, node_id: NodeId, position: Position) {
        let _ = self.event_tx.send(SurfaceEvent::NodeMoved { node_id, position });
    }

    /// Drain all pending patches without blocking.
    pub fn drain_patches(&self) -> Vec<DocPatch> {
        let mut patches = Vec::new();
        while let Ok(patch) = self.patch_rx.try_recv() {
            patches.push(patch);
        }
        patches
    }

    pub fn try_recv(&self) -> Option<DocPatch> {
        self.patch_rx.try_recv().ok()
    }
}

/// Drives a sync instance from bridged events until the event channel
/// closes or the patch consumer goes away.
pub fn run_sync_loop(
    mut sync: DiagramSync,
    events: Receiver<SurfaceEvent>,
    patches: Sender<DocPatch>,
) {
    while let Ok(event) = events.recv() {
        for patch in sync.handle_event(event) {
            if patches.send(patch).is_err() {
                return;
            }
        }
    }
}
