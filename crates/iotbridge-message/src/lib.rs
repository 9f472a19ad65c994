//! Topic/body messages and single-shot stream I/O for the iotbridge relay.
//!
//! A message travels unframed: one connection carries one payload and the
//! connection closing marks its end. By convention the first line of the
//! payload is an MQTT topic and the rest is the body.
//!
//! The receive side reads into a fixed-size buffer and appends a NUL
//! terminator so the bytes can be treated as text. What happens to payloads
//! that do not fit is governed by [`OverflowPolicy`].

pub mod error;
pub mod file;
pub mod message;
pub mod reader;
pub mod writer;

pub use error::{MessageError, Result};
pub use file::load_message_file;
pub use message::{
    split_topic, Message, MessageConfig, OverflowPolicy, DEFAULT_MAX_MESSAGE_SIZE,
};
pub use reader::MessageReader;
pub use writer::MessageWriter;
