//! Pipeline submit collaborator and bounded-concurrency admission.
//!
//! Persisting and running pipelines happens over a generic HTTP layer that
//! is not part of this core; [`PipelineService`] is the seam it plugs into.
//! What *is* preserved here is the admission policy of the original
//! request layer: at most a fixed number of submissions in flight, excess
//! requests queued FIFO and started only as running ones complete.

use crate::error::{PipevisError, Result};
use crate::types::{Pipeline, SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Default cap on concurrently in-flight submissions.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Connection settings for the submit collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    /// 0 disables the cap.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000/api/v1"),
            token: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// External collaborator that persists/runs a pipeline and returns the
/// canonical document.
#[async_trait]
pub trait PipelineService: Send + Sync {
    async fn submit_pipeline(&self, session: &SessionId, pipeline: &Pipeline) -> Result<Pipeline>;
}

/// Caps concurrent submissions on an inner service.
///
/// Waiters are admitted in FIFO order as permits free up, matching the
/// queue-and-counter behavior of the original throttled client.
pub struct Throttled<S> {
    inner: S,
    permits: Option<Arc<Semaphore>>,
}

impl<S> Throttled<S> {
    pub fn new(inner: S) -> Self {
        Self::with_limit(inner, DEFAULT_MAX_IN_FLIGHT)
    }

    /// A limit of 0 disables admission control.
    pub fn with_limit(inner: S, limit: usize) -> Self {
        Self {
            inner,
            permits: (limit > 0).then(|| Arc::new(Semaphore::new(limit))),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: PipelineService> PipelineService for Throttled<S> {
    async fn submit_pipeline(&self, session: &SessionId, pipeline: &Pipeline) -> Result<Pipeline> {
        let _permit = match &self.permits {
            Some(semaphore) => Some(
                semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| PipevisError::Channel("submit throttle closed".to_string()))?,
            ),
            None => None,
        };
        self.inner.submit_pipeline(session, pipeline).await
    }
}
