use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{MessageError, Result};
use crate::message::{Message, MessageConfig, OverflowPolicy};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads one message from any `Read` stream.
///
/// Under [`OverflowPolicy::Truncate`] this issues exactly one read call; a
/// peer that sends more than the buffer holds, or splits its write, is cut
/// at whatever that call returned.
pub struct MessageReader<T> {
    inner: T,
    config: MessageConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, MessageConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: MessageConfig) -> Self {
        Self { inner, config }
    }

    /// Read the message (blocking).
    ///
    /// A peer that closes without sending anything yields an empty message.
    pub fn read_message(&mut self) -> Result<Message> {
        match self.config.overflow {
            OverflowPolicy::Truncate => self.read_once(),
            OverflowPolicy::Reject => self.read_to_limit(),
        }
    }

    fn read_once(&mut self) -> Result<Message> {
        let mut buf = BytesMut::zeroed(self.config.payload_capacity());
        let read = loop {
            match self.inner.read(&mut buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(MessageError::Io(err)),
            }
        };
        buf.truncate(read);
        Ok(Message::terminate(buf))
    }

    fn read_to_limit(&mut self) -> Result<Message> {
        let max = self.config.payload_capacity();
        let mut buf = BytesMut::with_capacity(max + 1);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(MessageError::Io(err)),
            };
            if read == 0 {
                return Ok(Message::terminate(buf));
            }
            if buf.len() + read > max {
                return Err(MessageError::TooLarge { max });
            }
            buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}
