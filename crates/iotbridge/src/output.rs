use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use iotbridge_message::Message;
use iotbridge_relay::MessageHook;
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput {
    sequence: u64,
    size: usize,
    topic: String,
    body: String,
    timestamp: String,
}

/// Receive hook that prints every message to stdout.
///
/// Write failures (a closed pipe, a full disk) are logged and the message is
/// dropped; the receiver keeps running.
pub struct MessagePrinter<W = io::Stdout> {
    format: OutputFormat,
    sequence: u64,
    out: W,
}

impl MessagePrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writer(format, io::stdout())
    }
}

impl<W: Write> MessagePrinter<W> {
    pub fn with_writer(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            sequence: 0,
            out,
        }
    }
}

impl<W: Write> MessageHook for MessagePrinter<W> {
    fn process(&mut self, message: &Message) {
        self.sequence += 1;
        if let Err(err) = write_message(&mut self.out, message, self.sequence, self.format) {
            warn!(sequence = self.sequence, error = %err, "failed to print message");
        }
    }
}

fn write_message<W: Write>(
    out: &mut W,
    message: &Message,
    sequence: u64,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let record = MessageOutput {
                sequence,
                size: message.len(),
                topic: text_preview(message.topic()),
                body: text_preview(message.body()),
                timestamp: now_unix_seconds(),
            };
            serde_json::to_writer(&mut *out, &record)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "SIZE", "TOPIC", "BODY"])
                .add_row(vec![
                    sequence.to_string(),
                    message.len().to_string(),
                    text_preview(message.topic()),
                    text_preview(message.body()),
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(out, "Receive {} Byte\n{}", message.len(), message.text())?;
        }
        OutputFormat::Raw => out.write_all(message.as_bytes())?,
    }
    out.flush()
}

fn text_preview(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", bytes.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
