use std::fmt;
use std::io;

use iotbridge_message::MessageError;
use iotbridge_relay::RelayError;
use iotbridge_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const TIMEOUT: i32 = 124;
pub const INTERRUPTED: i32 = 130;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        // Nobody listening: missing socket file or a stale one.
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => TRANSPORT_ERROR,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Socket(source)
        | TransportError::Bind { source, .. }
        | TransportError::Listen { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_code(source),
        TransportError::InvalidPath { .. } | TransportError::PathTooLong { .. } => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    match err {
        MessageError::Transport(err) => transport_error(context, err),
        MessageError::FileRead { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        MessageError::PartialWrite { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        MessageError::TooLarge { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        MessageError::Io(ref source) => CliError::new(io_code(source), format!("{context}: {err}")),
    }
}

pub fn relay_error(context: &str, err: RelayError) -> CliError {
    match err {
        RelayError::Transport(err) => transport_error(context, err),
        RelayError::Message(err) => message_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn unreadable_file_exits_one() {
        let err = relay_error(
            "send failed",
            RelayError::Message(MessageError::FileRead {
                path: PathBuf::from("/nope"),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("send failed: failed to read message file /nope"));
    }

    #[test]
    fn refused_connect_exits_one() {
        let err = transport_error(
            "send failed",
            TransportError::Connect {
                path: PathBuf::from("/tmp/x.sock"),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn partial_write_is_transport_error() {
        let err = message_error(
            "send failed",
            MessageError::PartialWrite {
                written: 1,
                expected: 2,
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn bind_permission_denied() {
        let err = transport_error(
            "receiver setup failed",
            TransportError::Bind {
                path: PathBuf::from("/root/x.sock"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }
}
