use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use iotbridge_message::{Message, MessageConfig, MessageReader};
use iotbridge_transport::{
    BridgeStream, Endpoint, ListenOptions, SocketListener, TransportError, DEFAULT_BACKLOG,
};
use tracing::{debug, info, warn};

use crate::cancel::StopHandle;
use crate::error::Result;
use crate::hook::MessageHook;

/// Receiver behaviour config.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Buffer size, overflow policy and read timeout for each message.
    pub message: MessageConfig,
    /// Kernel accept queue depth. Peers beyond it wait or are refused while
    /// the hook runs.
    pub backlog: i32,
    /// Permission bits for the socket file. `None` keeps the umask default.
    pub socket_mode: Option<u32>,
    /// Remove the socket file when the receiver finishes.
    pub remove_on_exit: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            message: MessageConfig::default(),
            backlog: DEFAULT_BACKLOG,
            socket_mode: None,
            remove_on_exit: false,
        }
    }
}

/// Why the receive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// The iteration budget was spent.
    #[default]
    Completed,
    /// A [`StopHandle`] asked the loop to stop.
    Cancelled,
}

/// Outcome of a receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiveSummary {
    /// Accept cycles started.
    pub iterations: u64,
    /// Messages handed to the hook.
    pub delivered: u64,
    /// Iterations lost to a failed accept.
    pub accept_failures: u64,
    /// Iterations lost to a failed read.
    pub read_failures: u64,
    pub termination: Termination,
}

/// Owns a listening endpoint and serves one message per connection.
pub struct Receiver {
    listener: SocketListener,
    endpoint: Endpoint,
    config: MessageConfig,
    stop: Arc<AtomicBool>,
}

impl Receiver {
    /// Bind and listen on `endpoint`.
    ///
    /// Errors here are fatal: the loop cannot start without its endpoint.
    pub fn bind(endpoint: &Endpoint, config: ReceiverConfig) -> Result<Self> {
        let options = ListenOptions {
            backlog: config.backlog,
            mode: config.socket_mode,
            remove_on_drop: config.remove_on_exit,
        };
        let listener = SocketListener::bind_with(endpoint, &options)?;
        Ok(Self {
            listener,
            endpoint: endpoint.clone(),
            config: config.message,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle for stopping this receiver from another thread.
    ///
    /// A receiver whose handle is never used blocks in accept until a peer
    /// connects, however long that takes.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(Arc::clone(&self.stop), self.endpoint.clone())
    }

    /// The endpoint this receiver listens on.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Serve up to `max_messages` connections, then close the endpoint.
    ///
    /// Zero or negative budgets return immediately. Every accept cycle spends
    /// one unit of budget, including cycles whose accept or read failed.
    pub fn run<H>(self, hook: &mut H, max_messages: i64) -> ReceiveSummary
    where
        H: MessageHook + ?Sized,
    {
        let budget = u64::try_from(max_messages).unwrap_or(0);
        let mut incoming = ListenerIncoming {
            listener: &self.listener,
            config: &self.config,
        };
        let summary = serve(&mut incoming, hook, &self.config, &self.stop, budget);
        info!(
            endpoint = %self.endpoint,
            iterations = summary.iterations,
            delivered = summary.delivered,
            accept_failures = summary.accept_failures,
            read_failures = summary.read_failures,
            termination = ?summary.termination,
            "receiver finished"
        );
        summary
    }
}

/// Bind `endpoint` with default config and serve up to `max_messages`
/// connections.
pub fn run<H>(endpoint: impl AsRef<Path>, max_messages: i64, hook: &mut H) -> Result<ReceiveSummary>
where
    H: MessageHook + ?Sized,
{
    let endpoint = Endpoint::new(endpoint)?;
    let receiver = Receiver::bind(&endpoint, ReceiverConfig::default())?;
    Ok(receiver.run(hook, max_messages))
}

/// Source of accepted connections for the receive loop.
trait Incoming {
    type Stream: Read;

    fn next_connection(&mut self) -> std::result::Result<Self::Stream, TransportError>;
}

struct ListenerIncoming<'a> {
    listener: &'a SocketListener,
    config: &'a MessageConfig,
}

impl Incoming for ListenerIncoming<'_> {
    type Stream = BridgeStream;

    fn next_connection(&mut self) -> std::result::Result<BridgeStream, TransportError> {
        let stream = self.listener.accept()?;
        stream.set_read_timeout(self.config.read_timeout)?;
        Ok(stream)
    }
}

fn serve<I, H>(
    incoming: &mut I,
    hook: &mut H,
    config: &MessageConfig,
    stop: &AtomicBool,
    budget: u64,
) -> ReceiveSummary
where
    I: Incoming,
    H: MessageHook + ?Sized,
{
    let mut summary = ReceiveSummary::default();

    for _ in 0..budget {
        if stop.load(Ordering::SeqCst) {
            summary.termination = Termination::Cancelled;
            break;
        }
        summary.iterations += 1;

        debug!(iteration = summary.iterations, "waiting for message");
        let stream = match incoming.next_connection() {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "accept failed");
                summary.accept_failures += 1;
                continue;
            }
        };

        if stop.load(Ordering::SeqCst) {
            drop(stream);
            summary.termination = Termination::Cancelled;
            break;
        }

        let message = match read_and_close(stream, config) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "read failed");
                summary.read_failures += 1;
                continue;
            }
        };

        debug!(len = message.len(), "processing message");
        hook.process(&message);
        summary.delivered += 1;
    }

    summary
}

// The stream is dropped, and so closed, before the message is returned.
fn read_and_close<S: Read>(
    stream: S,
    config: &MessageConfig,
) -> iotbridge_message::Result<Message> {
    let mut reader = MessageReader::with_config(stream, config.clone());
    reader.read_message()
}
