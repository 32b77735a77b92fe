//! Fan-out of decoded notification envelopes to interested listeners.
//!
//! One multiplexer sits behind one transport. Frames are decoded in
//! arrival order and dispatched to the listeners registered for the
//! envelope's action type. Listener sets have set semantics keyed by
//! listener identity: subscribing the same listener twice is a single
//! registration, unsubscribing an absent one is a no-op.
//!
//! Dispatch iterates a snapshot of the listener set, so a listener may
//! unsubscribe (itself included) during its own invocation. A removal only
//! guarantees no *future* deliveries; a dispatch already in flight still
//! reaches the listener once.

use crate::notify::frame::{DecodedFrame, FrameDecoder, NotificationEnvelope};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// A notification listener. Identity (the `Arc` pointer) doubles as the
/// subscription key, mirroring remove-by-identity listener APIs.
pub type Listener = Arc<dyn Fn(&NotificationEnvelope) + Send + Sync + 'static>;

/// Wraps a closure into a [`Listener`] handle.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&NotificationEnvelope) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Routes decoded envelopes to listeners keyed by action type.
///
/// Explicitly constructed and explicitly owned: create one per active
/// session, pass it by reference, and call [`close`](Self::close) when the
/// session ends.
pub struct NotificationMultiplexer {
    decoder: FrameDecoder,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    dropped_frames: AtomicU64,
    foreign_frames: AtomicU64,
}

impl NotificationMultiplexer {
    pub fn new(decoder: FrameDecoder) -> Self {
        Self {
            decoder,
            listeners: Mutex::new(HashMap::new()),
            dropped_frames: AtomicU64::new(0),
            foreign_frames: AtomicU64::new(0),
        }
    }

    /// Registers a listener for an action type. Idempotent: a listener
    /// already present for that type is not added again.
    pub fn subscribe(&self, action: impl Into<String>, listener: &Listener) {
        let mut listeners = self.lock();
        let set = listeners.entry(action.into()).or_default();
        if !set.iter().any(|existing| Arc::ptr_eq(existing, listener)) {
            set.push(listener.clone());
        }
    }

    /// Removes a listener if present, else a no-op.
    pub fn unsubscribe(&self, action: &str, listener: &Listener) {
        let mut listeners = self.lock();
        if let Some(set) = listeners.get_mut(action) {
            set.retain(|existing| !Arc::ptr_eq(existing, listener));
            if set.is_empty() {
                listeners.remove(action);
            }
        }
    }

    /// Decodes one raw frame and dispatches the envelope. Decode failures
    /// and foreign frames are dropped silently; neither is fatal to the
    /// connection.
    pub async fn on_frame(&self, frame: &[u8]) {
        match self.decoder.decode(frame).await {
            Ok(DecodedFrame::Envelope(envelope)) => self.dispatch(&envelope),
            Ok(DecodedFrame::Foreign) => {
                self.foreign_frames.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%err, "dropping undecodable frame");
            }
        }
    }

    /// Dispatches an already-decoded envelope to the listeners registered
    /// for its action type.
    pub fn dispatch(&self, envelope: &NotificationEnvelope) {
        let snapshot: Vec<Listener> = self
            .lock()
            .get(envelope.action.as_str())
            .cloned()
            .unwrap_or_default();
        for listener in snapshot {
            listener(envelope);
        }
    }

    /// Processes frames in arrival order until the transport closes.
    /// Frames queue in the channel; there is no backpressure beyond it.
    pub async fn run(&self, mut frames: mpsc::Receiver<Bytes>) {
        while let Some(frame) = frames.recv().await {
            self.on_frame(&frame).await;
        }
    }

    pub fn listener_count(&self, action: &str) -> usize {
        self.lock().get(action).map_or(0, Vec::len)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn foreign_frames(&self) -> u64 {
        self.foreign_frames.load(Ordering::Relaxed)
    }

    /// Releases every listener set. Called at session teardown.
    pub fn close(&self) {
        let released: usize = {
            let mut listeners = self.lock();
            let count = listeners.values().map(Vec::len).sum();
            listeners.clear();
            count
        };
        let dropped = self.dropped_frames();
        if dropped > 0 {
            tracing::warn!(dropped, "multiplexer dropped undecodable frames this session");
        }
        tracing::debug!(released, "notification multiplexer closed");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Listener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
