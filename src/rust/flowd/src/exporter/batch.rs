use super::{DatagramSender, ExportTime, SendError, SequenceCounter, WireFormat};
use crate::encoder::RecordEncoder;
use crate::flow_data::{FlowKey, FlowRecord};
use crate::ipfix::{template_set, HEADER_LEN as IPFIX_HEADER_LEN};
use crate::stats::ExporterStats;
use crate::template::TemplateManager;
use flow_config::ExporterConfig;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("A {record} byte record plus {overhead} bytes of headers exceeds the {max_payload} byte payload limit")]
    RecordDoesNotFit {
        record: usize,
        overhead: usize,
        max_payload: usize,
    },
    #[error("A {template} byte template message exceeds the {max_payload} byte payload limit")]
    TemplateDoesNotFit { template: usize, max_payload: usize },
    #[error("Transport is unusable after {messages_sent} messages: {source}")]
    SocketUnusable {
        messages_sent: usize,
        #[source]
        source: io::Error,
    },
}

/// Records accumulated for one message.
#[derive(Debug, Default)]
pub struct ExportBatch {
    pub records: Vec<u8>,
    pub count: usize,
}

impl ExportBatch {
    fn fits(&self, record_length: usize, overhead: usize, max_payload: usize, max_records: usize) -> bool {
        self.count < max_records && overhead + self.records.len() + record_length <= max_payload
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Outcome of one export pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    /// Flows in messages that were handed to the transport
    pub flows: usize,
    pub messages: usize,
    pub send_failures: usize,
}

pub struct BatchExporter<T: DatagramSender> {
    encoder: RecordEncoder,
    format: WireFormat,
    max_payload: usize,
    max_records: usize,
    sequence: SequenceCounter,
    transport: T,
    stats: Arc<ExporterStats>,
}

impl<T: DatagramSender> BatchExporter<T> {
    pub fn new(
        config: &ExporterConfig,
        templates: &TemplateManager,
        transport: T,
        stats: Arc<ExporterStats>,
    ) -> Result<Self, ExportError> {
        let encoder = RecordEncoder::new(templates);
        let format = WireFormat::new(config, templates);
        let max_payload = config.max_payload_bytes;
        if format.overhead() + encoder.record_length() > max_payload {
            return Err(ExportError::RecordDoesNotFit {
                record: encoder.record_length(),
                overhead: format.overhead(),
                max_payload,
            });
        }
        if templates.needs_announcement() {
            let template = IPFIX_HEADER_LEN + template_set(&templates.build()).len();
            if template > max_payload {
                return Err(ExportError::TemplateDoesNotFit { template, max_payload });
            }
        }
        Ok(Self {
            encoder,
            format,
            max_payload,
            max_records: config.max_records_per_message.max(1),
            sequence: SequenceCounter::new(config.initial_sequence),
            transport,
            stats,
        })
    }

    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    /// Encodes `records` in order and splits them into batches that each
    /// respect the payload and record-count limits. Never returns an
    /// empty batch.
    pub fn pack(&self, records: &[(FlowKey, FlowRecord)]) -> Vec<ExportBatch> {
        let overhead = self.format.overhead();
        let record_length = self.encoder.record_length();
        let mut batches = Vec::new();
        let mut current = ExportBatch::default();
        for (key, record) in records.iter() {
            if !current.fits(record_length, overhead, self.max_payload, self.max_records) {
                batches.push(std::mem::take(&mut current));
            }
            self.encoder.encode_into(key, record, &mut current.records);
            current.count += 1;
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    /// Packs, frames and sends `records`. Each message takes the next
    /// sequence number whether or not its send succeeds. A failed send is
    /// counted and the pass carries on; an unusable socket ends the pass.
    pub fn export(&self, records: &[(FlowKey, FlowRecord)]) -> Result<ExportReport, ExportError> {
        let mut report = ExportReport::default();
        if records.is_empty() {
            return Ok(report);
        }
        let time = ExportTime::now();
        for batch in self.pack(records) {
            let sequence = self.sequence.next();
            let message = self.format.data_message(&batch.records, batch.count, sequence, &time);
            match self.transport.send(&message) {
                Ok(()) => {
                    report.messages += 1;
                    report.flows += batch.count;
                    ExporterStats::add(&self.stats.messages_sent, 1);
                    ExporterStats::add(&self.stats.flows_exported, batch.count as u64);
                }
                Err(SendError::Transient(e)) => {
                    warn!("Failed to send flow message {sequence} ({} records): {e}", batch.count);
                    report.send_failures += 1;
                    ExporterStats::add(&self.stats.send_failures, 1);
                }
                Err(SendError::SocketUnusable(e)) => {
                    error!("Flow transport is unusable, abandoning this export pass: {e}");
                    ExporterStats::add(&self.stats.send_failures, 1);
                    return Err(ExportError::SocketUnusable {
                        messages_sent: report.messages,
                        source: e,
                    });
                }
            }
        }
        debug!(
            "Exported {} flows in {} messages ({} failed)",
            report.flows, report.messages, report.send_failures
        );
        Ok(report)
    }

    /// Sends the template in its own message. Returns `Ok(false)` when
    /// the protocol has no templates or the send was lost.
    pub fn announce_template(&self, templates: &TemplateManager) -> Result<bool, ExportError> {
        if !templates.needs_announcement() {
            return Ok(false);
        }
        let set = template_set(&templates.build());
        let sequence = self.sequence.next();
        let Some(message) = self.format.template_message(&set, sequence, &ExportTime::now()) else {
            return Ok(false);
        };
        match self.transport.send(&message) {
            Ok(()) => {
                ExporterStats::add(&self.stats.templates_sent, 1);
                info!("Announced template {}", templates.build().id());
                Ok(true)
            }
            Err(SendError::Transient(e)) => {
                warn!("Failed to send template: {e}");
                ExporterStats::add(&self.stats.send_failures, 1);
                Ok(false)
            }
            Err(SendError::SocketUnusable(e)) => {
                ExporterStats::add(&self.stats.send_failures, 1);
                Err(ExportError::SocketUnusable {
                    messages_sent: 0,
                    source: e,
                })
            }
        }
    }

    /// Drops the exporter, closing its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::exporter::CapturingSender;
    use crate::flow_data::{FlowTable, PacketEvent, IPPROTO_UDP};
    use crate::ipfix::{IpfixHeader, SetHeader};
    use crate::netflow5::{Netflow5Header, Netflow5Record};
    use flow_config::{EnterpriseConfig, EnterpriseFieldConfig, ExportProtocol, IpfixConfig, StandardField};

    fn flows(n: usize) -> Vec<(FlowKey, FlowRecord)> {
        let mut table = FlowTable::new();
        for i in 0..n {
            table.ingest(PacketEvent::new(
                "10.0.0.1".parse().unwrap(),
                "10.0.0.2".parse().unwrap(),
                1000 + i as u16,
                53,
                IPPROTO_UDP,
                100 + i as u32,
                i as u64,
            ));
        }
        table.drain_all()
    }

    fn v5_exporter(config: ExporterConfig, sender: CapturingSender) -> BatchExporter<CapturingSender> {
        BatchExporter::new(&config, &TemplateManager::netflow5(), sender, Arc::new(ExporterStats::default())).unwrap()
    }

    #[test]
    fn five_flows_two_per_message() {
        let config = ExporterConfig {
            max_records_per_message: 2,
            ..Default::default()
        };
        let sender = CapturingSender::new();
        let exporter = v5_exporter(config, sender.clone());
        let report = exporter.export(&flows(5)).unwrap();
        assert_eq!(report.messages, 3);
        assert_eq!(report.flows, 5);

        let sent = sender.sent();
        let headers: Vec<Netflow5Header> = sent.iter().map(|m| Netflow5Header::decode(m).unwrap()).collect();
        let counts: Vec<u16> = headers.iter().map(|h| h.count).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        let sequences: Vec<u32> = headers.iter().map(|h| h.flow_sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        for (message, header) in sent.iter().zip(headers.iter()) {
            assert_eq!(message.len(), 24 + 48 * header.count as usize);
        }
        // Records come out in the order they were drained
        let first = Netflow5Record::decode(&sent[0][24..]).unwrap();
        assert_eq!(first.src_port, 1000);
    }

    #[test]
    fn payload_limit_splits_messages() {
        let config = ExporterConfig {
            max_records_per_message: 30,
            // Header plus three records
            max_payload_bytes: 24 + 48 * 3,
            ..Default::default()
        };
        let sender = CapturingSender::new();
        let exporter = v5_exporter(config, sender.clone());
        exporter.export(&flows(7)).unwrap();
        let sizes: Vec<usize> = sender.sent().iter().map(|m| m.len()).collect();
        assert_eq!(sizes, vec![168, 168, 72]);
    }

    #[test]
    fn nothing_to_export_sends_nothing() {
        let sender = CapturingSender::new();
        let exporter = v5_exporter(ExporterConfig::default(), sender.clone());
        let report = exporter.export(&[]).unwrap();
        assert_eq!(report, ExportReport::default());
        assert_eq!(sender.attempts(), 0);
        assert_eq!(exporter.sequence().peek(), 1);
    }

    #[test]
    fn transient_failure_continues() {
        let config = ExporterConfig {
            max_records_per_message: 1,
            ..Default::default()
        };
        let sender = CapturingSender::new().failing_at(&[1]);
        let exporter = v5_exporter(config, sender.clone());
        let report = exporter.export(&flows(3)).unwrap();
        assert_eq!(report.messages, 2);
        assert_eq!(report.send_failures, 1);
        let sequences: Vec<u32> = sender
            .sent()
            .iter()
            .map(|m| Netflow5Header::decode(m).unwrap().flow_sequence)
            .collect();
        // The lost message still used up sequence 2
        assert_eq!(sequences, vec![1, 3]);
    }

    #[test]
    fn unusable_socket_halts_pass() {
        let config = ExporterConfig {
            max_records_per_message: 1,
            ..Default::default()
        };
        let sender = CapturingSender::new().unusable_from(1);
        let exporter = v5_exporter(config, sender.clone());
        let result = exporter.export(&flows(3));
        assert!(matches!(result, Err(ExportError::SocketUnusable { messages_sent: 1, .. })));
        assert_eq!(sender.attempts(), 2);
    }

    #[test]
    fn sequence_wraps_across_messages() {
        let config = ExporterConfig {
            max_records_per_message: 1,
            initial_sequence: u32::MAX,
            ..Default::default()
        };
        let sender = CapturingSender::new();
        let exporter = v5_exporter(config, sender.clone());
        exporter.export(&flows(2)).unwrap();
        let sequences: Vec<u32> = sender
            .sent()
            .iter()
            .map(|m| Netflow5Header::decode(m).unwrap().flow_sequence)
            .collect();
        assert_eq!(sequences, vec![u32::MAX, 0]);
    }

    #[test]
    fn ipfix_messages_are_self_describing() {
        let config = ExporterConfig {
            protocol: ExportProtocol::Ipfix,
            max_records_per_message: 10,
            max_payload_bytes: 1472,
            ..Default::default()
        };
        let templates = TemplateManager::ipfix(&IpfixConfig::default()).unwrap();
        let sender = CapturingSender::new();
        let exporter = BatchExporter::new(&config, &templates, sender.clone(), Arc::new(ExporterStats::default())).unwrap();
        assert!(exporter.announce_template(&templates).unwrap());
        exporter.export(&flows(5)).unwrap();

        let sent = sender.sent();
        // Template, then 350 byte records: (1472 - 20) / 350 = 4 per message
        assert_eq!(sent.len(), 3);
        let template_header = IpfixHeader::decode(&sent[0]).unwrap();
        assert_eq!(template_header.sequence, 1);
        assert_eq!(SetHeader::decode(&sent[0][16..]).unwrap().set_id, 2);
        for (i, message) in sent.iter().enumerate() {
            let header = IpfixHeader::decode(message).unwrap();
            assert_eq!(header.length as usize, message.len());
            assert!(message.len() <= 1472);
            assert_eq!(header.sequence, 1 + i as u32);
            assert_eq!(header.domain_id, 1234);
        }
        let set = SetHeader::decode(&sent[1][16..]).unwrap();
        assert_eq!(set.set_id, 256);
        assert_eq!(set.length as usize, 4 + 4 * 350);
    }

    #[test]
    fn netflow5_has_no_template() {
        let sender = CapturingSender::new();
        let exporter = v5_exporter(ExporterConfig::default(), sender.clone());
        assert!(!exporter.announce_template(&TemplateManager::netflow5()).unwrap());
        assert_eq!(sender.attempts(), 0);
    }

    #[test]
    fn oversized_records_are_refused() {
        let config = ExporterConfig {
            protocol: ExportProtocol::Ipfix,
            max_payload_bytes: 200,
            ..Default::default()
        };
        let templates = TemplateManager::ipfix(&IpfixConfig::default()).unwrap();
        let result = BatchExporter::new(&config, &templates, CapturingSender::new(), Arc::new(ExporterStats::default()));
        assert!(matches!(result, Err(ExportError::RecordDoesNotFit { record: 350, .. })));
    }

    #[test]
    fn oversized_template_is_refused() {
        let narrow = EnterpriseFieldConfig { id: 100, length: 1 };
        let ipfix = IpfixConfig {
            fields: vec![StandardField::ProtocolIdentifier],
            include_http_fields: true,
            enterprise: EnterpriseConfig {
                http_url: narrow,
                http_user_agent: EnterpriseFieldConfig { id: 101, ..narrow },
                http_host: EnterpriseFieldConfig { id: 102, ..narrow },
                ..Default::default()
            },
            ..Default::default()
        };
        let templates = TemplateManager::ipfix(&ipfix).unwrap();
        // A 4 byte record fits in 24 bytes, the template message needs
        // 16 + 4 + 4 + 4 + 3 * 8 = 52
        let config = ExporterConfig {
            protocol: ExportProtocol::Ipfix,
            max_payload_bytes: 40,
            ..Default::default()
        };
        let result = BatchExporter::new(&config, &templates, CapturingSender::new(), Arc::new(ExporterStats::default()));
        assert!(matches!(
            result,
            Err(ExportError::TemplateDoesNotFit {
                template: 52,
                max_payload: 40
            })
        ));

        let config = ExporterConfig {
            max_payload_bytes: 52,
            ..config
        };
        let sender = CapturingSender::new();
        let exporter = BatchExporter::new(&config, &templates, sender.clone(), Arc::new(ExporterStats::default())).unwrap();
        assert!(exporter.announce_template(&templates).unwrap());
        assert_eq!(sender.sent()[0].len(), 52);
    }
}
