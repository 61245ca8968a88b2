//! Stream adapter for decoding binary event-stream messages from byte chunks.
//!
//! Each message on the wire is laid out as:
//!
//! ```text
//! total length (u32) | headers length (u32) | prelude CRC (u32)
//! headers            | payload              | message CRC (u32)
//! ```
//!
//! All integers are big-endian. Headers are `name length (u8) | name |
//! value type (u8) | value`.

use bytes::{Buf, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

const PRELUDE_LEN: usize = 12;
const CRC_LEN: usize = 4;
const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Bytes(Vec<u8>),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

/// One decoded event-stream message.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStreamMessage {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Bytes,
}

impl EventStreamMessage {
    /// Value of a string header.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(key, value)| match value {
            HeaderValue::String(s) if key == name => Some(s.as_str()),
            _ => None,
        })
    }

    /// `:message-type`, usually `event` or `exception`.
    pub fn message_type(&self) -> Option<&str> {
        self.header_str(":message-type")
    }

    /// `:event-type`, e.g. `chunk`.
    pub fn event_type(&self) -> Option<&str> {
        self.header_str(":event-type")
    }

    /// `:exception-type` of an exception message.
    pub fn exception_type(&self) -> Option<&str> {
        self.header_str(":exception-type")
    }
}

fn take<'a>(buf: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8], Error> {
    if buf.remaining() < len {
        return Err(Error::streaming(format!("Truncated event-stream {what}")));
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn parse_headers(mut buf: &[u8]) -> Result<Vec<(String, HeaderValue)>, Error> {
    let mut headers = Vec::new();

    while buf.has_remaining() {
        let name_len = take(&mut buf, 1, "header name")?[0] as usize;
        let name = std::str::from_utf8(take(&mut buf, name_len, "header name")?)
            .map_err(|e| Error::streaming(format!("Invalid UTF-8 in header name: {e}")))?
            .to_string();
        let value_type = take(&mut buf, 1, "header type")?[0];

        let value = match value_type {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => HeaderValue::Byte(take(&mut buf, 1, "header value")?.get_i8()),
            3 => HeaderValue::Short(take(&mut buf, 2, "header value")?.get_i16()),
            4 => HeaderValue::Int(take(&mut buf, 4, "header value")?.get_i32()),
            5 => HeaderValue::Long(take(&mut buf, 8, "header value")?.get_i64()),
            6 | 7 => {
                let len = take(&mut buf, 2, "header value")?.get_u16() as usize;
                let raw = take(&mut buf, len, "header value")?;
                if value_type == 6 {
                    HeaderValue::Bytes(raw.to_vec())
                } else {
                    HeaderValue::String(
                        std::str::from_utf8(raw)
                            .map_err(|e| Error::streaming(format!("Invalid UTF-8 in header '{name}': {e}")))?
                            .to_string(),
                    )
                }
            }
            8 => HeaderValue::Timestamp(take(&mut buf, 8, "header value")?.get_i64()),
            9 => {
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(take(&mut buf, 16, "header value")?);
                HeaderValue::Uuid(uuid)
            }
            other => {
                return Err(Error::streaming(format!(
                    "Unknown header value type {other} for '{name}'"
                )))
            }
        };

        headers.push((name, value));
    }

    Ok(headers)
}

/// Decode one complete message frame (prelude through message CRC).
pub fn decode_message(mut frame: Bytes) -> Result<EventStreamMessage, Error> {
    if frame.len() < PRELUDE_LEN + CRC_LEN {
        return Err(Error::streaming("Event-stream message shorter than its prelude"));
    }

    let total_len = frame.get_u32() as usize;
    let headers_len = frame.get_u32() as usize;
    let _prelude_crc = frame.get_u32();

    if total_len != frame.len() + PRELUDE_LEN
        || headers_len > total_len - PRELUDE_LEN - CRC_LEN
    {
        return Err(Error::streaming(format!(
            "Inconsistent event-stream lengths: total {total_len}, headers {headers_len}"
        )));
    }

    let headers = parse_headers(&frame.split_to(headers_len))?;
    let payload = frame.split_to(frame.len() - CRC_LEN);

    Ok(EventStreamMessage { headers, payload })
}

/// A stream adapter that decodes event-stream messages from a byte stream.
/// Maintains internal state to handle messages split across chunks.
pub struct EventStream<S> {
    /// The underlying byte stream
    inner: S,
    /// Bytes received but not yet decoded
    buffer: BytesMut,
    done: bool,
}

impl<S> EventStream<S> {
    /// Create a new event-stream decoder from a byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: BytesMut::new(),
            done: false,
        }
    }

    /// Split the next complete frame off the buffer, if one has arrived.
    fn next_frame(&mut self) -> Result<Option<Bytes>, Error> {
        if self.buffer.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let total_len = (&self.buffer[..4]).get_u32() as usize;
        if total_len < PRELUDE_LEN + CRC_LEN {
            return Err(Error::streaming(format!(
                "Event-stream message length {total_len} is too small"
            )));
        }
        if total_len > MAX_MESSAGE_LEN {
            return Err(Error::streaming(format!(
                "Event-stream message length {total_len} exceeds maximum size"
            )));
        }

        if self.buffer.len() < total_len {
            return Ok(None);
        }
        Ok(Some(self.buffer.split_to(total_len).freeze()))
    }
}

impl<S, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<EventStreamMessage, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        loop {
            match self.next_frame() {
                Ok(Some(frame)) => return Poll::Ready(Some(decode_message(frame))),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    self.buffer.clear();
                    return Poll::Ready(Some(Err(e)));
                }
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "Stream error: {}",
                        e.into()
                    )))));
                }
                None => {
                    self.done = true;
                    if !self.buffer.is_empty() {
                        let leftover = self.buffer.len();
                        self.buffer.clear();
                        return Poll::Ready(Some(Err(Error::streaming(format!(
                            "Stream ended inside an event-stream message ({leftover} bytes pending)"
                        )))));
                    }
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Extension trait to add event-stream decoding to byte streams.
pub trait EventStreamExt: Stream {
    /// Decode this byte stream as event-stream messages.
    fn event_stream(self) -> EventStream<Self>
    where
        Self: Sized,
    {
        EventStream::new(self)
    }
}

impl<S: Stream> EventStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use futures_util::stream;

    /// Frame a message with string headers. CRC fields are left zeroed.
    fn frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
        let mut encoded_headers = Vec::new();
        for (name, value) in headers {
            encoded_headers.put_u8(name.len() as u8);
            encoded_headers.put_slice(name.as_bytes());
            encoded_headers.put_u8(7);
            encoded_headers.put_u16(value.len() as u16);
            encoded_headers.put_slice(value.as_bytes());
        }

        let total = PRELUDE_LEN + encoded_headers.len() + payload.len() + CRC_LEN;
        let mut out = Vec::with_capacity(total);
        out.put_u32(total as u32);
        out.put_u32(encoded_headers.len() as u32);
        out.put_u32(0);
        out.put_slice(&encoded_headers);
        out.put_slice(payload);
        out.put_u32(0);
        out
    }

    fn chunk_frame(payload: &str) -> Vec<u8> {
        frame(
            &[(":event-type", "chunk"), (":message-type", "event"), (":content-type", "application/json")],
            payload.as_bytes(),
        )
    }

    #[tokio::test]
    async fn test_event_stream_complete_messages() {
        let mut wire = chunk_frame(r#"{"bytes":"YQ=="}"#);
        wire.extend(chunk_frame(r#"{"bytes":"Yg=="}"#));

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(wire))];
        let mut messages = stream::iter(chunks).event_stream();

        let first = messages.next().await.unwrap().unwrap();
        assert_eq!(first.event_type(), Some("chunk"));
        assert_eq!(first.message_type(), Some("event"));
        assert_eq!(&first.payload[..], br#"{"bytes":"YQ=="}"#);

        let second = messages.next().await.unwrap().unwrap();
        assert_eq!(&second.payload[..], br#"{"bytes":"Yg=="}"#);

        assert!(messages.next().await.is_none());
    }

    #[tokio::test]
    async fn test_event_stream_split_messages() {
        let wire = chunk_frame(r#"{"bytes":"YWJj"}"#);
        let (head, tail) = wire.split_at(7);
        let (middle, tail) = tail.split_at(20);

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(middle)),
            Ok(Bytes::copy_from_slice(tail)),
        ];
        let mut messages = stream::iter(chunks).event_stream();

        let message = messages.next().await.unwrap().unwrap();
        assert_eq!(&message.payload[..], br#"{"bytes":"YWJj"}"#);
        assert!(messages.next().await.is_none());
    }

    #[tokio::test]
    async fn test_event_stream_truncated_message_errors() {
        let wire = chunk_frame(r#"{"bytes":"YQ=="}"#);
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::copy_from_slice(&wire[..wire.len() - 3]))];
        let mut messages = stream::iter(chunks).event_stream();

        let result = messages.next().await.unwrap();
        assert!(matches!(result, Err(Error::Streaming(_))));
        assert!(messages.next().await.is_none());
    }

    #[tokio::test]
    async fn test_event_stream_rejects_oversized_length() {
        let mut wire = Vec::new();
        wire.put_u32((MAX_MESSAGE_LEN + 1) as u32);
        wire.put_u32(0);
        wire.put_u32(0);

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(wire))];
        let mut messages = stream::iter(chunks).event_stream();

        let err = messages.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("exceeds maximum size"));
    }

    #[test]
    fn test_decode_typed_headers() {
        let mut headers = Vec::new();
        headers.put_u8(5);
        headers.put_slice(b"flag!");
        headers.put_u8(0);
        headers.put_u8(3);
        headers.put_slice(b"num");
        headers.put_u8(4);
        headers.put_i32(-7);

        let total = PRELUDE_LEN + headers.len() + CRC_LEN;
        let mut wire = Vec::new();
        wire.put_u32(total as u32);
        wire.put_u32(headers.len() as u32);
        wire.put_u32(0);
        wire.put_slice(&headers);
        wire.put_u32(0);

        let message = decode_message(Bytes::from(wire)).unwrap();
        assert_eq!(
            message.headers,
            vec![
                ("flag!".to_string(), HeaderValue::Bool(true)),
                ("num".to_string(), HeaderValue::Int(-7)),
            ]
        );
        assert!(message.payload.is_empty());
        assert_eq!(message.header_str("num"), None);
    }

    #[test]
    fn test_decode_inconsistent_header_length() {
        let mut wire = Vec::new();
        wire.put_u32(16);
        wire.put_u32(10);
        wire.put_u32(0);
        wire.put_u32(0);

        assert!(matches!(
            decode_message(Bytes::from(wire)),
            Err(Error::Streaming(_))
        ));
    }
}
