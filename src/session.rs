//! Live session ownership.
//!
//! A [`Session`] ties one open notification transport to one submit
//! collaborator. It owns the multiplexer and the task pumping frames into
//! it, and hands out per-display subscription channels. There is no
//! ambient singleton: whoever creates the session passes it to consumers
//! and calls [`shutdown`](Session::shutdown) when it ends.

use crate::client::PipelineService;
use crate::error::Result;
use crate::notify::display::DisplayChannel;
use crate::notify::frame::FrameDecoder;
use crate::notify::multiplexer::NotificationMultiplexer;
use crate::types::{NodeId, Pipeline, SessionId};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An active session against one backend.
pub struct Session {
    id: SessionId,
    notifications: Arc<NotificationMultiplexer>,
    service: Arc<dyn PipelineService>,
    pump: Option<JoinHandle<()>>,
}

impl Session {
    /// Starts a session over an already-open frame transport.
    ///
    /// `frames` is the inbound byte-frame stream; the pump task processes
    /// frames in arrival order until the transport side closes the
    /// channel.
    pub fn start(
        id: SessionId,
        decoder: FrameDecoder,
        frames: mpsc::Receiver<Bytes>,
        service: Arc<dyn PipelineService>,
    ) -> Self {
        let notifications = Arc::new(NotificationMultiplexer::new(decoder));
        let pump_mux = notifications.clone();
        let pump = tokio::spawn(async move {
            pump_mux.run(frames).await;
            tracing::debug!("notification transport closed");
        });
        tracing::info!(session = %id, "session started");
        Self {
            id,
            notifications,
            service,
            pump: Some(pump),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn notifications(&self) -> &Arc<NotificationMultiplexer> {
        &self.notifications
    }

    /// Opens a display-scoped subscription channel.
    pub fn open_display(&self, display_id: NodeId) -> DisplayChannel {
        DisplayChannel::new(display_id, self.notifications.clone())
    }

    /// Persists/runs a pipeline through the submit collaborator.
    pub async fn submit(&self, pipeline: &Pipeline) -> Result<Pipeline> {
        self.service.submit_pipeline(&self.id, pipeline).await
    }

    /// Ends the session: stops the frame pump and releases every listener
    /// set. An in-flight dispatch may still reach a listener once.
    pub async fn shutdown(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            let _ = pump.await;
        }
        self.notifications.close();
        tracing::info!(session = %self.id, "session shut down");
    }
}
