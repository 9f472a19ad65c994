use std::io::{ErrorKind, Write};

#[cfg(unix)]
use iotbridge_transport::BridgeStream;

use crate::error::{MessageError, Result};
#[cfg(unix)]
use crate::message::MessageConfig;

/// Writes one unframed payload to any `Write` stream.
///
/// The payload goes out in a single write call. A short write is reported as
/// [`MessageError::PartialWrite`] and is not completed.
pub struct MessageWriter<T> {
    inner: T,
}

impl<T: Write> MessageWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write `payload` verbatim (blocking). Returns the number of bytes sent.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<usize> {
        let written = loop {
            match self.inner.write(payload) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(MessageError::Io(err)),
            }
        };

        if written < payload.len() {
            return Err(MessageError::PartialWrite {
                written,
                expected: payload.len(),
            });
        }
        Ok(written)
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(unix)]
impl MessageWriter<BridgeStream> {
    /// Create a writer for a connected stream and apply the write timeout.
    pub fn with_config_stream(inner: BridgeStream, config: &MessageConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::new(inner))
    }
}
