use std::thread;
use std::time::Duration;

use iotbridge_message::{MessageConfig, OverflowPolicy};
use iotbridge_relay::{Receiver, ReceiverConfig, StopHandle, Termination};
use iotbridge_transport::Endpoint;
use tracing::{info, warn};

use crate::cmd::RecvArgs;
use crate::exit::{
    relay_error, transport_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS,
};

/// How long a stop request may take before the process exits anyway.
///
/// The stop flag is only seen between connections, so a peer that holds its
/// connection open or a slow hook would otherwise keep the receiver alive.
const STOP_GRACE: Duration = Duration::from_secs(2);
use crate::output::{MessagePrinter, OutputFormat};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint =
        Endpoint::new(&args.endpoint).map_err(|err| transport_error("invalid endpoint", err))?;
    let receiver = Receiver::bind(&endpoint, receiver_config(&args))
        .map_err(|err| relay_error("receiver setup failed", err))?;

    install_stop_handler(receiver.stop_handle())?;

    let mut printer = MessagePrinter::new(format);
    let summary = receiver.run(&mut printer, args.max_messages);
    if summary.termination == Termination::Cancelled {
        info!(delivered = summary.delivered, "receiver interrupted");
    }

    Ok(SUCCESS)
}

fn receiver_config(args: &RecvArgs) -> ReceiverConfig {
    let overflow = if args.reject_oversized {
        OverflowPolicy::Reject
    } else {
        OverflowPolicy::Truncate
    };
    ReceiverConfig {
        message: MessageConfig {
            max_message_size: args.max_message_size,
            overflow,
            read_timeout: args.read_timeout,
            write_timeout: None,
        },
        backlog: args.backlog,
        socket_mode: args.socket_mode,
        remove_on_exit: args.remove_on_exit,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    Stop,
    Exit,
}

/// First signal asks for a cooperative stop; any later one exits.
#[derive(Debug, Default)]
struct SignalCounter {
    received: u32,
}

impl SignalCounter {
    fn next(&mut self) -> SignalAction {
        self.received = self.received.saturating_add(1);
        if self.received == 1 {
            SignalAction::Stop
        } else {
            SignalAction::Exit
        }
    }
}

fn install_stop_handler(stop: StopHandle) -> CliResult<()> {
    let mut signals = SignalCounter::default();
    ctrlc::set_handler(move || match signals.next() {
        SignalAction::Stop => {
            // Armed before the wake-up connect, which can block on a full backlog.
            thread::spawn(|| {
                thread::sleep(STOP_GRACE);
                force_exit("receiver did not stop within grace period");
            });
            stop.stop();
        }
        SignalAction::Exit => force_exit("second interrupt received"),
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn force_exit(reason: &str) -> ! {
    warn!(reason, "exiting without finishing the current connection");
    std::process::exit(INTERRUPTED)
}
