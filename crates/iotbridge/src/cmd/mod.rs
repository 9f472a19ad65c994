use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use iotbridge_message::DEFAULT_MAX_MESSAGE_SIZE;
use iotbridge_transport::DEFAULT_BACKLOG;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod recv;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message file to a receiver endpoint.
    Send(SendArgs),
    /// Receive a fixed number of messages on an endpoint.
    Recv(RecvArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Recv(args) => recv::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub endpoint: PathBuf,
    /// Message file: line 1 is the topic, lines 2..n are the body.
    pub file: PathBuf,
    /// Give up on a write that blocks longer than this (e.g. 5s, 500ms).
    #[arg(long, value_parser = parse_duration)]
    pub write_timeout: Option<Duration>,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    /// Socket path to bind. An existing file at this path is replaced.
    pub endpoint: PathBuf,
    /// Number of connections to serve before exiting (zero or less serves none).
    #[arg(allow_negative_numbers = true)]
    pub max_messages: i64,
    /// Receive buffer size in bytes, including the terminator byte.
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE, value_parser = parse_message_size)]
    pub max_message_size: usize,
    /// Drop messages that do not fit the buffer instead of truncating them.
    #[arg(long)]
    pub reject_oversized: bool,
    /// Give up on a connection that sends nothing for this long (e.g. 5s, 500ms).
    #[arg(long, value_parser = parse_duration)]
    pub read_timeout: Option<Duration>,
    /// Listen backlog depth.
    #[arg(long, default_value_t = DEFAULT_BACKLOG, value_parser = clap::value_parser!(i32).range(1..))]
    pub backlog: i32,
    /// Octal permission bits for the socket file (e.g. 660).
    #[arg(long, value_parser = parse_mode)]
    pub socket_mode: Option<u32>,
    /// Remove the socket file on exit.
    #[arg(long)]
    pub remove_on_exit: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

fn parse_message_size(input: &str) -> Result<usize, String> {
    let size: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid message size: {input}"))?;
    // One byte is the terminator; a usable buffer needs at least one more.
    if size < 2 {
        return Err("message size must be at least 2 bytes".to_string());
    }
    Ok(size)
}

fn parse_mode(input: &str) -> Result<u32, String> {
    let digits = input.trim().trim_start_matches("0o");
    let mode =
        u32::from_str_radix(digits, 8).map_err(|_| format!("invalid octal mode: {input}"))?;
    if mode > 0o7777 {
        return Err(format!("mode out of range: {input}"));
    }
    Ok(mode)
}
