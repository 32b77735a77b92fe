//! Display-scoped subscription layer.
//!
//! Display widgets share one multiplexer without cross-talk through a
//! two-level routing discipline: frames are first dispatched by action
//! type, then each display-bound listener checks `payload.displayId`
//! against its own display before acting. A listener registered for
//! display X never fires for a frame addressed to display Y.

use crate::notify::frame::NotificationEnvelope;
use crate::notify::multiplexer::{Listener, NotificationMultiplexer};
use crate::types::NodeId;
use rmpv::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Action vocabulary consumed by display widgets.
pub const DISPLAY_ADD_INPUT: &str = "DISPLAY_ADD_INPUT";
pub const DISPLAY_REMOVE_INPUT: &str = "DISPLAY_REMOVE_INPUT";
pub const DISPLAY_CLEAR_INPUTS: &str = "DISPLAY_CLEAR_INPUTS";
pub const DISPLAY_RENDER: &str = "DISPLAY_RENDER";

/// Renderable payload fields, with routing fields stripped. Unknown fields
/// are preserved opaquely.
pub type RenderFields = Vec<(String, Value)>;

/// A display action parsed out of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    AddInput {
        source_id: String,
        fields: RenderFields,
    },
    RemoveInput {
        source_id: String,
    },
    ClearInputs,
    Render {
        fields: RenderFields,
    },
}

impl DisplayEvent {
    /// Parses the display action vocabulary. Returns `None` for other
    /// action types or payloads missing their routing fields.
    pub fn from_envelope(envelope: &NotificationEnvelope) -> Option<DisplayEvent> {
        match envelope.action.as_str() {
            DISPLAY_ADD_INPUT => Some(DisplayEvent::AddInput {
                source_id: envelope.source_id()?,
                fields: renderable_fields(envelope),
            }),
            DISPLAY_REMOVE_INPUT => Some(DisplayEvent::RemoveInput {
                source_id: envelope.source_id()?,
            }),
            DISPLAY_CLEAR_INPUTS => Some(DisplayEvent::ClearInputs),
            DISPLAY_RENDER => Some(DisplayEvent::Render {
                fields: renderable_fields(envelope),
            }),
            _ => None,
        }
    }
}

fn renderable_fields(envelope: &NotificationEnvelope) -> RenderFields {
    let Some(map) = envelope.payload.as_map() else {
        return RenderFields::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?;
            if key == "displayId" || key == "sourceId" {
                return None;
            }
            Some((key.to_string(), value.clone()))
        })
        .collect()
}

/// Per-display subscription handle over a shared multiplexer.
///
/// Every listener registered through this channel is wrapped with the
/// display-id filter. Dropping the channel (or calling
/// [`close`](Self::close)) unsubscribes everything it registered.
pub struct DisplayChannel {
    display_id: NodeId,
    multiplexer: Arc<NotificationMultiplexer>,
    registered: Mutex<Vec<(String, Listener)>>,
}

impl DisplayChannel {
    pub fn new(display_id: NodeId, multiplexer: Arc<NotificationMultiplexer>) -> Self {
        Self {
            display_id,
            multiplexer,
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn display_id(&self) -> &NodeId {
        &self.display_id
    }

    /// Registers `f` for an action type, filtered to this display.
    /// Returns the handle to pass to [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, action: &str, f: F) -> Listener
    where
        F: Fn(&NotificationEnvelope) + Send + Sync + 'static,
    {
        let display_id = self.display_id.clone();
        let wrapped: Listener = Arc::new(move |envelope: &NotificationEnvelope| {
            if envelope.display_id().as_deref() == Some(display_id.as_str()) {
                f(envelope);
            }
        });
        self.multiplexer.subscribe(action, &wrapped);
        self.lock().push((action.to_string(), wrapped.clone()));
        wrapped
    }

    pub fn unsubscribe(&self, action: &str, handle: &Listener) {
        self.multiplexer.unsubscribe(action, handle);
        self.lock()
            .retain(|(a, l)| !(a == action && Arc::ptr_eq(l, handle)));
    }

    /// Unsubscribes everything registered through this channel.
    pub fn close(&self) {
        for (action, handle) in self.lock().drain(..) {
            self.multiplexer.unsubscribe(&action, &handle);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, Listener)>> {
        self.registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DisplayChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// The input set every display widget keeps locally: renderable fields
/// per upstream source, mutated by the display action vocabulary.
#[derive(Debug, Clone, Default)]
pub struct DisplayInputs {
    inputs: BTreeMap<String, RenderFields>,
}

impl DisplayInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a display event. Returns true when the widget should
    /// repaint.
    pub fn apply(&mut self, event: &DisplayEvent) -> bool {
        match event {
            DisplayEvent::AddInput { source_id, fields } => {
                self.inputs.insert(source_id.clone(), fields.clone());
                false
            }
            DisplayEvent::RemoveInput { source_id } => {
                self.inputs.remove(source_id);
                false
            }
            DisplayEvent::ClearInputs => {
                self.inputs.clear();
                false
            }
            DisplayEvent::Render { .. } => true,
        }
    }

    pub fn get(&self, source_id: &str) -> Option<&RenderFields> {
        self.inputs.get(source_id)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RenderFields)> {
        self.inputs.iter()
    }
}
