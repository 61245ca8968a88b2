#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::BufMut;
use serde_json::Value;

/// Frame one event-stream message with string headers. CRC fields are zeroed;
/// the decoder does not verify them.
pub fn frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut encoded_headers = Vec::new();
    for (name, value) in headers {
        encoded_headers.put_u8(name.len() as u8);
        encoded_headers.put_slice(name.as_bytes());
        encoded_headers.put_u8(7);
        encoded_headers.put_u16(value.len() as u16);
        encoded_headers.put_slice(value.as_bytes());
    }

    let total = 12 + encoded_headers.len() + payload.len() + 4;
    let mut out = Vec::with_capacity(total);
    out.put_u32(total as u32);
    out.put_u32(encoded_headers.len() as u32);
    out.put_u32(0);
    out.put_slice(&encoded_headers);
    out.put_slice(payload);
    out.put_u32(0);
    out
}

/// A `chunk` event wrapping `body` the way the runtime does.
pub fn chunk_frame(body: &Value) -> Vec<u8> {
    let envelope = serde_json::json!({
        "bytes": STANDARD.encode(serde_json::to_vec(body).unwrap())
    });
    frame(
        &[
            (":event-type", "chunk"),
            (":content-type", "application/json"),
            (":message-type", "event"),
        ],
        envelope.to_string().as_bytes(),
    )
}

/// An exception message as sent mid-stream.
pub fn exception_frame(exception_type: &str, message: &str) -> Vec<u8> {
    let payload = serde_json::json!({ "message": message });
    frame(
        &[
            (":exception-type", exception_type),
            (":content-type", "application/json"),
            (":message-type", "exception"),
        ],
        payload.to_string().as_bytes(),
    )
}

/// Concatenate frames into one response body.
pub fn event_stream_body(frames: Vec<Vec<u8>>) -> Vec<u8> {
    frames.into_iter().flatten().collect()
}
