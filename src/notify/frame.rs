//! Binary frame decoding into typed notification envelopes.
//!
//! Inbound frames are MessagePack-encoded structured values. Depending on
//! the backend protocol version they arrive in one of two shapes:
//!
//! - **tagged**: `{type: "@@OREMDA", action, payload}`; frames with any
//!   other `type` belong to someone else and decode to [`DecodedFrame::Foreign`]
//! - **bare**: the value itself carries `action`/`payload`, and the
//!   transport's own message-type label becomes part of envelope identity
//!
//! Payloads stay untyped ([`rmpv::Value`]) so binary fields such as
//! rendered image bytes survive without a schema.

use rmpv::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Envelope tag identifying frames addressed to this client.
pub const ENVELOPE_TAG: &str = "@@OREMDA";

/// A frame that could not be decoded. The caller drops the message; the
/// connection stays open.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] rmpv::decode::Error),
}

/// Which envelope shape the backend emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeShape {
    Tagged,
    Bare { label: String },
}

/// The decoded, typed representation of one inbound notification frame.
/// Ephemeral: constructed per frame, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEnvelope {
    /// String tag identifying what kind of event this envelope carries.
    pub action: String,
    /// Untyped structured payload.
    pub payload: Value,
    /// Transport message-type label, for bare-envelope protocols.
    pub label: Option<String>,
}

impl NotificationEnvelope {
    /// Routing field: the display instance this envelope addresses.
    pub fn display_id(&self) -> Option<String> {
        self.field("displayId").and_then(value_to_id)
    }

    /// Routing field: the upstream source the payload originates from.
    pub fn source_id(&self) -> Option<String> {
        self.field("sourceId").and_then(value_to_id)
    }

    /// Looks up a top-level payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        map_get(self.payload.as_map()?, key)
    }
}

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Envelope(NotificationEnvelope),
    /// Parsed fine but not addressed to us.
    Foreign,
}

/// Decodes binary message frames into envelopes.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    shape: EnvelopeShape,
}

impl FrameDecoder {
    pub fn tagged() -> Self {
        Self {
            shape: EnvelopeShape::Tagged,
        }
    }

    pub fn bare(label: impl Into<String>) -> Self {
        Self {
            shape: EnvelopeShape::Bare {
                label: label.into(),
            },
        }
    }

    /// Streaming decode: reads the frame body to completion, then parses
    /// it as a single MessagePack value.
    pub async fn decode<R>(&self, mut reader: R) -> Result<DecodedFrame, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut frame = Vec::new();
        reader.read_to_end(&mut frame).await?;
        self.decode_slice(&frame)
    }

    /// Synchronous decode of a complete frame buffer.
    pub fn decode_slice(&self, frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
        let value = rmpv::decode::read_value(&mut &frame[..])?;
        Ok(self.envelope_from(value))
    }

    fn envelope_from(&self, value: Value) -> DecodedFrame {
        let Some(map) = value.as_map() else {
            return DecodedFrame::Foreign;
        };

        match &self.shape {
            EnvelopeShape::Tagged => {
                let tag = map_get(map, "type").and_then(Value::as_str);
                if tag != Some(ENVELOPE_TAG) {
                    return DecodedFrame::Foreign;
                }
                let Some(action) = map_get(map, "action").and_then(Value::as_str) else {
                    return DecodedFrame::Foreign;
                };
                DecodedFrame::Envelope(NotificationEnvelope {
                    action: action.to_string(),
                    payload: map_get(map, "payload").cloned().unwrap_or(Value::Nil),
                    label: None,
                })
            }
            EnvelopeShape::Bare { label } => {
                let Some(action) = map_get(map, "action").and_then(Value::as_str) else {
                    return DecodedFrame::Foreign;
                };
                DecodedFrame::Envelope(NotificationEnvelope {
                    action: action.to_string(),
                    payload: map_get(map, "payload").cloned().unwrap_or(Value::Nil),
                    label: Some(label.clone()),
                })
            }
        }
    }
}

fn map_get<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

/// Ids arrive as strings or integers depending on the backend store.
fn value_to_id(value: &Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if let Some(i) = value.as_i64() {
        return Some(i.to_string());
    }
    value.as_u64().map(|u| u.to_string())
}
