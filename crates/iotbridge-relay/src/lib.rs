//! One-message-per-connection relay over Unix domain sockets.
//!
//! A [`Receiver`] owns an endpoint and, for a fixed number of iterations,
//! accepts one connection, reads one message, closes the connection and
//! hands the message to a [`MessageHook`] before accepting again. Processing
//! is strictly sequential; peers that connect meanwhile wait in the listen
//! backlog.
//!
//! A [`Sender`] is the counterpart: connect, write once, close.

pub mod error;
pub mod hook;

#[cfg(unix)]
pub mod cancel;
#[cfg(unix)]
pub mod receiver;
#[cfg(unix)]
pub mod sender;

pub use error::{RelayError, Result};
pub use hook::MessageHook;

#[cfg(unix)]
pub use cancel::StopHandle;
#[cfg(unix)]
pub use receiver::{run, ReceiveSummary, Receiver, ReceiverConfig, Termination};
#[cfg(unix)]
pub use sender::{send, Sender};
