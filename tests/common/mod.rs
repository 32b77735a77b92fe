//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use rmpv::Value;

/// Initialize test logging once; respects `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();
}

/// Encode a MessagePack value into a frame buffer.
pub fn encode_frame(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value).expect("encode test frame");
    buf
}

/// Build a tagged `@@OREMDA` frame for an action and payload map.
pub fn tagged_frame(action: &str, payload: Vec<(&str, Value)>) -> Vec<u8> {
    encode_frame(&Value::Map(vec![
        ("type".into(), pipevis_rs::notify::ENVELOPE_TAG.into()),
        ("action".into(), action.into()),
        (
            "payload".into(),
            Value::Map(
                payload
                    .into_iter()
                    .map(|(k, v)| (Value::from(k), v))
                    .collect(),
            ),
        ),
    ]))
}

/// Build a tagged frame the way the server does: serde-encoded straight
/// from a JSON-shaped value. Use [`tagged_frame`] for payloads carrying
/// binary fields.
pub fn tagged_frame_json(action: &str, payload: serde_json::Value) -> Vec<u8> {
    rmp_serde::to_vec_named(&serde_json::json!({
        "type": pipevis_rs::notify::ENVELOPE_TAG,
        "action": action,
        "payload": payload,
    }))
    .expect("encode test frame")
}
