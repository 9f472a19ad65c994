use std::path::PathBuf;

/// Errors that can occur in endpoint transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint path cannot name a Unix domain socket.
    #[error("invalid endpoint path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// The endpoint path does not fit in `sockaddr_un.sun_path`.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Failed to create the socket.
    #[error("socket() failed: {0}")]
    Socket(std::io::Error),

    /// Failed to bind to the specified address.
    #[error("bind() failed for {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to mark the bound socket as listening.
    #[error("listen() failed for {path}: {source}")]
    Listen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("accept() failed: {0}")]
    Accept(std::io::Error),

    /// Failed to connect to the specified address.
    #[error("connect() failed for {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on a connected stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
