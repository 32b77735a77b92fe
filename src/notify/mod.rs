//! Binary-framed notification multiplexing.
//!
//! The backend pushes MessagePack frames over a persistent transport; this
//! module decodes each frame into a typed envelope and fans it out to
//! independent subscribers:
//!
//! ```text
//! transport ──frames──► [FrameDecoder] ──envelopes──► [NotificationMultiplexer]
//!                                                          │ action type
//!                                                          ▼
//!                                                   [DisplayChannel] ── displayId
//! ```
//!
//! Frames are processed strictly in arrival order, one at a time. A frame
//! that fails to decode is dropped; the connection stays open.

pub mod display;
pub mod frame;
pub mod multiplexer;

pub use display::{
    DisplayChannel, DisplayEvent, DisplayInputs, RenderFields, DISPLAY_ADD_INPUT,
    DISPLAY_CLEAR_INPUTS, DISPLAY_REMOVE_INPUT, DISPLAY_RENDER,
};
pub use frame::{
    DecodeError, DecodedFrame, EnvelopeShape, FrameDecoder, NotificationEnvelope, ENVELOPE_TAG,
};
pub use multiplexer::{listener, Listener, NotificationMultiplexer};
