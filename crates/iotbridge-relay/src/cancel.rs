use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use iotbridge_transport::{Endpoint, SocketListener};
use tracing::debug;

/// Requests that a running receiver stop.
///
/// The flag is checked before every accept and again when accept returns.
/// Because accept blocks, [`StopHandle::stop`] also opens one throwaway
/// connection to the endpoint to wake the receiver; that connection is
/// dropped without reaching the hook.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    endpoint: Endpoint,
}

impl StopHandle {
    pub(crate) fn new(flag: Arc<AtomicBool>, endpoint: Endpoint) -> Self {
        Self { flag, endpoint }
    }

    /// Ask the receiver to stop. Calling it again has no further effect.
    pub fn stop(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        match SocketListener::connect(&self.endpoint) {
            Ok(stream) => drop(stream),
            // Receiver already gone, nothing to wake.
            Err(err) => debug!(endpoint = %self.endpoint, error = %err, "stop wake-up not delivered"),
        }
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
