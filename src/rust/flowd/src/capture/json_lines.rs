//! Reads one JSON packet event per line from stdin or a FIFO, the way
//! an external capture helper writes them:
//!
//! ```json
//! {"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","src_port":40000,"dst_port":80,"protocol":6,"length":320,"tcp_flags":24,"payload_hex":"474554202f20485454502f312e310d0a"}
//! ```

use super::CaptureError;
use crate::flow_data::{HttpFields, PacketEvent};
use crate::stats::ExporterStats;
use crossbeam_channel::{Sender, TrySendError};
use flow_config::CaptureConfig;
use flow_utils::hex_string::read_hex_bytes;
use flow_utils::unix_time::boot_time_ms;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
pub struct WirePacketEvent {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    #[serde(default)]
    pub src_port: u16,
    #[serde(default)]
    pub dst_port: u16,
    pub protocol: u8,
    pub length: u32,
    #[serde(default)]
    pub tcp_flags: Option<u8>,
    #[serde(default)]
    pub tos: u8,
    /// Boot-clock milliseconds. Stamped on arrival when absent.
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    /// Start of the transport payload, hex encoded
    #[serde(default)]
    pub payload_hex: Option<String>,
    /// Already-extracted HTTP attributes, for helpers that parse HTTP
    /// themselves
    #[serde(default)]
    pub http: Option<HttpFields>,
}

impl WirePacketEvent {
    fn into_event(self, now_ms: u64) -> Result<PacketEvent, CaptureError> {
        let mut event = PacketEvent::new(
            self.src_ip,
            self.dst_ip,
            self.src_port,
            self.dst_port,
            self.protocol,
            self.length,
            self.timestamp_ms.unwrap_or(now_ms),
        )
        .with_tos(self.tos);
        if let Some(flags) = self.tcp_flags {
            event = event.with_tcp_flags(flags);
        }
        if let Some(http) = self.http {
            event = event.with_http(http);
        }
        if let Some(hex) = self.payload_hex {
            let payload = read_hex_bytes(&hex).map_err(|e| CaptureError::Malformed(e.to_string()))?;
            event = event.with_payload(&payload);
        }
        Ok(event)
    }
}

/// Decodes one line. `now_ms` stamps events that carry no timestamp.
pub fn parse_packet_line(line: &str, now_ms: u64) -> Result<PacketEvent, CaptureError> {
    let wire: WirePacketEvent =
        serde_json::from_str(line).map_err(|e| CaptureError::Malformed(e.to_string()))?;
    wire.into_event(now_ms)
}

/// Starts the "Packet Reader" thread. It stops at end of input or when
/// the receiving side goes away; either way `tx` is dropped, which the
/// channel source reports as exhaustion.
pub fn spawn_json_reader(
    config: &CaptureConfig,
    tx: Sender<PacketEvent>,
    stats: Arc<ExporterStats>,
) -> Result<std::thread::JoinHandle<()>, CaptureError> {
    let reader: Box<dyn BufRead + Send> = if config.is_stdin() {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = config.source.trim().to_string();
        let file = File::open(&path).map_err(|source| CaptureError::CannotOpen { path, source })?;
        Box::new(BufReader::new(file))
    };
    let source_name = config.source.clone();

    std::thread::Builder::new()
        .name("Packet Reader".to_string())
        .spawn(move || {
            info!("Reading packet events from {source_name}");
            read_lines(reader, &tx, &stats);
            info!("Packet source {source_name} closed");
        })
        .map_err(|source| CaptureError::CannotOpen {
            path: config.source.clone(),
            source,
        })
}

fn read_lines(reader: Box<dyn BufRead + Send>, tx: &Sender<PacketEvent>, stats: &ExporterStats) {
    let mut clock_warned = false;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading packet source: {e}");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let now_ms = match boot_time_ms() {
            Ok(ms) => ms,
            Err(e) => {
                if !clock_warned {
                    warn!("Boot clock unavailable, unstamped events get time zero: {e}");
                    clock_warned = true;
                }
                0
            }
        };
        let event = match parse_packet_line(&line, now_ms) {
            Ok(event) => event,
            Err(e) => {
                debug!("Dropping packet event: {e}");
                ExporterStats::add(&stats.packets_dropped, 1);
                continue;
            }
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => ExporterStats::add(&stats.packets_dropped, 1),
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flow_data::IPPROTO_TCP;
    use std::io::Cursor;

    #[test]
    fn parse_minimal() {
        let line = r#"{"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","protocol":1,"length":84}"#;
        let event = parse_packet_line(line, 77).unwrap();
        assert_eq!(event.length, 84);
        assert_eq!(event.timestamp_ms, 77);
        assert_eq!(event.tcp_flags, None);
    }

    #[test]
    fn parse_http_payload() {
        let payload: String = b"GET /a HTTP/1.1\r\nHost: h.example\r\n\r\n"
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        let line = format!(
            r#"{{"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","src_port":40000,"dst_port":80,"protocol":6,"length":300,"tcp_flags":24,"timestamp_ms":5,"payload_hex":"{payload}"}}"#
        );
        let event = parse_packet_line(&line, 0).unwrap();
        assert_eq!(event.protocol, IPPROTO_TCP);
        assert_eq!(event.timestamp_ms, 5);
        assert_eq!(event.tcp_flags, Some(24));
        let http = event.http.unwrap();
        assert_eq!(http.url, "/a");
        assert_eq!(http.host, "h.example");
    }

    #[test]
    fn reject_bad_input() {
        assert!(parse_packet_line("not json", 0).is_err());
        assert!(parse_packet_line(r#"{"src_ip":"nope","dst_ip":"10.0.0.2","protocol":6,"length":1}"#, 0).is_err());
        assert!(parse_packet_line(r#"{"dst_ip":"10.0.0.2","protocol":6,"length":1}"#, 0).is_err());
        let odd_hex = r#"{"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","protocol":6,"length":1,"payload_hex":"abc"}"#;
        assert!(parse_packet_line(odd_hex, 0).is_err());
    }

    #[test]
    fn reader_counts_drops() {
        let input = concat!(
            r#"{"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","protocol":17,"length":10}"#,
            "\n\ngarbage\n",
            r#"{"src_ip":"10.0.0.1","dst_ip":"10.0.0.2","protocol":17,"length":20}"#,
            "\n"
        );
        let (tx, rx) = crossbeam_channel::bounded(16);
        let stats = ExporterStats::default();
        read_lines(Box::new(Cursor::new(input.as_bytes().to_vec())), &tx, &stats);
        drop(tx);
        let lengths: Vec<u32> = rx.iter().map(|e| e.length).collect();
        assert_eq!(lengths, vec![10, 20]);
        assert_eq!(stats.packets_dropped.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
