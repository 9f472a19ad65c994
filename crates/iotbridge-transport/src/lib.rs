//! Unix domain socket endpoints for the iotbridge message relay.
//!
//! This is the lowest layer of iotbridge. It validates endpoint paths,
//! creates listening sockets with an explicit backlog, and hands out one
//! [`BridgeStream`] per accepted or initiated connection.

pub mod endpoint;
pub mod error;

#[cfg(unix)]
pub mod stream;
#[cfg(unix)]
pub mod uds;

pub use endpoint::{Endpoint, MAX_PATH_LEN};
pub use error::{Result, TransportError};

#[cfg(unix)]
pub use stream::BridgeStream;
#[cfg(unix)]
pub use uds::{ListenOptions, SocketListener, DEFAULT_BACKLOG};
