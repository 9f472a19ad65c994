/// Errors that can occur in relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] iotbridge_transport::TransportError),

    /// Message-level error.
    #[error("message error: {0}")]
    Message(#[from] iotbridge_message::MessageError),
}

pub type Result<T> = std::result::Result<T, RelayError>;
