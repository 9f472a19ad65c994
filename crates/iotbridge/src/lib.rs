//! Local Unix-socket bridge for MQTT-style messages.
//!
//! iotbridge moves one message per connection between an IoT-core agent and
//! an application on the same host. Message files and payloads carry the
//! MQTT topic on their first line and the body after it.
//!
//! # Crate Structure
//!
//! - [`transport`] - Endpoint validation and Unix domain socket plumbing
//! - [`message`] - Message value, single-read reader, single-write writer
//! - [`relay`] - Receiver loop, processing hook, stop handle and sender

/// Re-export transport types.
pub mod transport {
    pub use iotbridge_transport::*;
}

/// Re-export message types.
pub mod message {
    pub use iotbridge_message::*;
}

/// Re-export relay types.
pub mod relay {
    pub use iotbridge_relay::*;
}
