use std::path::PathBuf;

/// Errors that can occur while reading, writing or loading messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The peer sent more than the configured maximum (reject policy only).
    #[error("message too large (more than {max} bytes)")]
    TooLarge { max: usize },

    /// A single write call did not hand the whole payload to the socket.
    #[error("partial write ({written} of {expected} bytes)")]
    PartialWrite { written: usize, expected: usize },

    /// The message source file could not be read.
    #[error("failed to read message file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred while reading or writing a message.
    #[error("message I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream configuration failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] iotbridge_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, MessageError>;
