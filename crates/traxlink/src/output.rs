use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use traxlink_datagram::{encode_response, AttitudeSample, ParserStats};

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
struct SampleOutput {
    seq: u64,
    pitch: f32,
    roll: f32,
    yaw: f32,
    heading_status: u8,
    heading_uncertainty: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct StatsOutput {
    accepted: u64,
    checksum_errors: u64,
    protocol_errors: u64,
    sync_bytes: u64,
    resets: u64,
}

#[derive(Serialize)]
struct CrcOutput {
    crc: u16,
    hex: String,
}

#[derive(Serialize)]
struct DatagramOutput {
    datagram: String,
}

/// Heading uncertainty class reported in the status byte.
pub fn heading_uncertainty(status: u8) -> &'static str {
    match status {
        1 => "low",
        2 => "medium",
        3 => "high",
        _ => "unknown",
    }
}

pub fn print_sample(seq: u64, sample: &AttitudeSample, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SampleOutput {
                seq,
                pitch: sample.pitch,
                roll: sample.roll,
                yaw: sample.yaw,
                heading_status: sample.heading_status,
                heading_uncertainty: heading_uncertainty(sample.heading_status),
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
                .set_header(vec!["SEQ", "PITCH", "ROLL", "YAW", "HEADING STATUS"])
                .add_row(vec![
                    seq.to_string(),
                    format!("{:.3}", sample.pitch),
                    format!("{:.3}", sample.roll),
                    format!("{:.3}", sample.yaw),
                    format!(
                        "{} ({})",
                        sample.heading_status,
                        heading_uncertainty(sample.heading_status)
                    ),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "P: {:.3}\tR: {:.3}\tY: {:.3}\tHS: {}",
                sample.pitch, sample.roll, sample.yaw, sample.heading_status
            );
        }
        OutputFormat::Raw => {
            let mut buf = BytesMut::new();
            if encode_response(sample, &mut buf).is_ok() {
                print_raw(&buf);
            }
        }
    }
}

pub fn print_stats(stats: &ParserStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatsOutput {
                accepted: stats.accepted,
                checksum_errors: stats.checksum_errors,
                protocol_errors: stats.protocol_errors,
                sync_bytes: stats.sync_bytes,
                resets: stats.resets,
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
                .set_header(vec!["COUNTER", "VALUE"])
                .add_row(vec!["accepted".to_string(), stats.accepted.to_string()])
                .add_row(vec![
                    "checksum errors".to_string(),
                    stats.checksum_errors.to_string(),
                ])
                .add_row(vec![
                    "protocol errors".to_string(),
                    stats.protocol_errors.to_string(),
                ])
                .add_row(vec!["sync bytes".to_string(), stats.sync_bytes.to_string()])
                .add_row(vec!["resets".to_string(), stats.resets.to_string()]);
            println!("{table}");
        }
        // Raw stdout carries datagrams only; counters go to stderr.
        OutputFormat::Pretty | OutputFormat::Raw => {
            let line = format!(
                "accepted={} checksum_errors={} protocol_errors={} sync_bytes={} resets={}",
                stats.accepted,
                stats.checksum_errors,
                stats.protocol_errors,
                stats.sync_bytes,
                stats.resets
            );
            if matches!(format, OutputFormat::Raw) {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    }
}

pub fn print_crc(crc: u16, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CrcOutput {
                crc,
                hex: format!("{crc:04x}"),
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
                .set_header(vec!["DECIMAL", "HEX"])
                .add_row(vec![crc.to_string(), format!("{crc:04x}")]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("crc:");
            println!("decimal: {crc}");
            println!("hex: {crc:x}");
        }
        OutputFormat::Raw => print_raw(&crc.to_be_bytes()),
    }
}

pub fn print_datagram(datagram: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(datagram),
        OutputFormat::Json => {
            let out = DatagramOutput {
                datagram: hex(datagram),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex(datagram)),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
