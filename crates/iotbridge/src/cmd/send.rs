use iotbridge_message::MessageConfig;
use iotbridge_relay::Sender;
use iotbridge_transport::Endpoint;
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{relay_error, transport_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let endpoint =
        Endpoint::new(&args.endpoint).map_err(|err| transport_error("invalid endpoint", err))?;
    let config = MessageConfig {
        write_timeout: args.write_timeout,
        ..MessageConfig::default()
    };
    let sender = Sender::with_config(endpoint, config);

    let written = sender
        .send_file(&args.file)
        .map_err(|err| relay_error("send failed", err))?;
    info!(endpoint = %sender.endpoint(), bytes = written, "sent message");

    Ok(SUCCESS)
}
