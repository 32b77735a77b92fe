//! Persisted editor state.
//!
//! The canonical pipeline document lives on the server; what the client
//! keeps locally is presentation state: node positions per pipeline and
//! the list of recently opened pipelines. State is stored as JSON in the
//! platform-appropriate data directory:
//!
//! - **Linux**: `~/.local/share/dev.hxyulin.pipevis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.pipevis-rs/`
//! - **Windows**: `%APPDATA%\dev.hxyulin.pipevis-rs\`

use crate::error::{PipevisError, Result};
use crate::graph::layout::Position;
use crate::types::{NodeId, PipelineId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Application identifier for data directories.
pub const APP_ID: &str = "dev.hxyulin.pipevis-rs";

/// Canvas state filename.
pub const CANVAS_STATE_FILE: &str = "canvas_state.json";

/// Maximum number of recent pipelines to remember.
pub const MAX_RECENT_PIPELINES: usize = 10;

/// A recently opened pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPipeline {
    pub id: PipelineId,
    pub name: String,
    pub opened_at: DateTime<Utc>,
}

/// Locally persisted presentation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    /// Node positions per pipeline, keyed by node id.
    #[serde(default)]
    pub positions: HashMap<PipelineId, HashMap<NodeId, Position>>,
    /// Most recently opened pipelines, newest first.
    #[serde(default)]
    pub recent: Vec<RecentPipeline>,
}

impl CanvasState {
    /// Platform data directory for this application.
    pub fn state_dir() -> Option<PathBuf> {
        dirs_next::data_dir().map(|dir| dir.join(APP_ID))
    }

    fn state_file() -> Result<PathBuf> {
        Self::state_dir()
            .map(|dir| dir.join(CANVAS_STATE_FILE))
            .ok_or_else(|| PipevisError::Config("no platform data directory".to_string()))
    }

    /// Loads persisted state, falling back to defaults when missing or
    /// unreadable.
    pub fn load_or_default() -> Self {
        match Self::state_file().and_then(|path| Self::load_from(&path)) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(%err, "starting with default canvas state");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves to the platform data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::state_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Records a pipeline as most recently opened.
    pub fn touch_recent(&mut self, id: PipelineId, name: impl Into<String>) {
        self.recent.retain(|entry| entry.id != id);
        self.recent.insert(
            0,
            RecentPipeline {
                id,
                name: name.into(),
                opened_at: Utc::now(),
            },
        );
        self.recent.truncate(MAX_RECENT_PIPELINES);
    }

    /// Stores the position overlay for a pipeline.
    pub fn remember_positions(
        &mut self,
        pipeline: &PipelineId,
        positions: &HashMap<NodeId, Position>,
    ) {
        self.positions.insert(pipeline.clone(), positions.clone());
    }

    pub fn positions_for(&self, pipeline: &PipelineId) -> Option<&HashMap<NodeId, Position>> {
        self.positions.get(pipeline)
    }

    /// Drops remembered state for pipelines no longer present.
    pub fn retain_pipelines(&mut self, exists: impl Fn(&PipelineId) -> bool) {
        self.positions.retain(|id, _| exists(id));
        self.recent.retain(|entry| exists(&entry.id));
    }
}
