use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hmilink_frame::Frame;
use hmilink_message::{Message, Snapshot};
use serde::Serialize;

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
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: Option<&'a str>,
    size: usize,
    payload: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<&'a str, &'a str>,
    timestamp: String,
}

/// Print one received frame, with its parsed message when it has one.
pub fn print_frame(frame: &Frame, message: Option<&Message>, format: OutputFormat) {
    let kind = message.map(|m| m.kind().as_str());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind,
                size: frame.len(),
                payload: payload_preview(frame.as_bytes()),
                fields: message.map(|m| m.fields().collect()).unwrap_or_default(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SIZE", "FIELDS", "PAYLOAD"])
                .add_row(vec![
                    kind.unwrap_or("-").to_string(),
                    frame.len().to_string(),
                    message.map_or(0, Message::len).to_string(),
                    payload_preview(frame.as_bytes()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} size={} payload={}",
                kind.unwrap_or("-"),
                frame.len(),
                payload_preview(frame.as_bytes())
            );
        }
        OutputFormat::Raw => {
            let mut line = frame.as_bytes().to_vec();
            line.push(b'\n');
            print_raw(&line);
        }
    }
}

/// Print the latest value of every field seen.
pub fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "FIELD", "VALUE"]);
            for (kind, key, value) in snapshot.entries() {
                table.add_row(vec![kind, key, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (kind, key, value) in snapshot.entries() {
                println!("{kind}.{key}={value}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
