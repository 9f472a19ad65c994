use std::path::Path;

use iotbridge_message::{load_message_file, MessageConfig, MessageWriter};
use iotbridge_transport::{Endpoint, SocketListener};
use tracing::{debug, warn};

use crate::error::Result;

/// Pushes one message per connection into a receiver's endpoint.
///
/// Each send is connect, one write, close. There is no retry and no
/// acknowledgement; success means the kernel took every byte.
#[derive(Debug, Clone)]
pub struct Sender {
    endpoint: Endpoint,
    config: MessageConfig,
}

impl Sender {
    /// Sender with default config (no write timeout).
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_config(endpoint, MessageConfig::default())
    }

    /// Sender with explicit config. Only the write timeout applies here.
    pub fn with_config(endpoint: Endpoint, config: MessageConfig) -> Self {
        Self { endpoint, config }
    }

    /// Send `payload` verbatim over a fresh connection.
    ///
    /// A connect failure means nothing was written. A short write is
    /// reported as a partial-write error and not completed.
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        let stream = SocketListener::connect(&self.endpoint)?;
        let mut writer = MessageWriter::with_config_stream(stream, &self.config)?;
        let result = writer.write_message(payload);
        if let Err(err) = writer.into_inner().close() {
            debug!(endpoint = %self.endpoint, error = %err, "close after send failed");
        }
        let written = result?;
        debug!(endpoint = %self.endpoint, bytes = written, "sent message");
        Ok(written)
    }

    /// Load a message file and send its content.
    ///
    /// Nothing is sent if the file cannot be read.
    pub fn send_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let payload = load_message_file(path)?;
        if !payload.contains(&b'\n') {
            warn!(?path, "message file has no newline; sending it as a topic with an empty body");
        }
        self.send(&payload)
    }

    /// The endpoint messages are sent to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// Send `payload` to `endpoint` with default config.
pub fn send(endpoint: impl AsRef<Path>, payload: &[u8]) -> Result<usize> {
    let endpoint = Endpoint::new(endpoint)?;
    Sender::new(endpoint).send(payload)
}
