use std::borrow::Cow;
use std::ffi::CStr;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

/// Default receive buffer size: 1 KiB, one byte of which is the terminator.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024;

/// What the receiver does with a message that does not fit its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Issue a single read of at most `max_message_size - 1` bytes and drop
    /// whatever else the peer sent. Neither side sees an error.
    #[default]
    Truncate,
    /// Read until the peer closes; anything past `max_message_size - 1`
    /// bytes fails the read with [`MessageError::TooLarge`].
    ///
    /// [`MessageError::TooLarge`]: crate::MessageError::TooLarge
    Reject,
}

/// Message I/O configuration.
#[derive(Debug, Clone)]
pub struct MessageConfig {
    /// Receive buffer size including the terminator byte.
    pub max_message_size: usize,
    /// Overflow handling on the receive side.
    pub overflow: OverflowPolicy,
    /// Per-connection read timeout. `None` blocks until data or EOF.
    pub read_timeout: Option<Duration>,
    /// Per-connection write timeout. `None` blocks until the write completes.
    pub write_timeout: Option<Duration>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            overflow: OverflowPolicy::Truncate,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl MessageConfig {
    /// Largest payload a receiver hands to its hook.
    pub fn payload_capacity(&self) -> usize {
        self.max_message_size.saturating_sub(1)
    }
}

/// A received message: raw bytes followed by a NUL terminator.
///
/// The terminator is not part of the message and is not counted by
/// [`Message::len`]. By convention the first line is the topic and the rest
/// is the body; nothing enforces that.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    // Always ends with a single trailing 0 that is not payload.
    buf: Bytes,
}

impl Message {
    /// Build a message from payload bytes.
    pub fn new(payload: impl AsRef<[u8]>) -> Self {
        let payload = payload.as_ref();
        let mut buf = BytesMut::with_capacity(payload.len() + 1);
        buf.put_slice(payload);
        Self::terminate(buf)
    }

    pub(crate) fn terminate(mut buf: BytesMut) -> Self {
        buf.put_u8(0);
        Self { buf: buf.freeze() }
    }

    /// Number of payload bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes, excluding the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Payload bytes followed by the terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// The payload as a C string, cut at the first NUL.
    ///
    /// Payloads containing NUL bytes are shortened here; use
    /// [`Message::as_bytes`] for the full content.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.buf).unwrap_or_default()
    }

    /// Shared handle to the payload bytes.
    pub fn payload(&self) -> Bytes {
        self.buf.slice(..self.len())
    }

    /// Payload decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// First line of the payload, without its newline.
    pub fn topic(&self) -> &[u8] {
        split_topic(self.as_bytes()).0
    }

    /// Everything after the first newline.
    pub fn body(&self) -> &[u8] {
        split_topic(self.as_bytes()).1
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("len", &self.len())
            .field("topic", &String::from_utf8_lossy(self.topic()))
            .finish()
    }
}

/// Split raw message bytes into `(topic, body)` at the first `\n`.
///
/// Without a newline the whole input is the topic and the body is empty.
pub fn split_topic(bytes: &[u8]) -> (&[u8], &[u8]) {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(idx) => (&bytes[..idx], &bytes[idx + 1..]),
        None => (bytes, &[]),
    }
}
