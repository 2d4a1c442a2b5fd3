//! Turns one aggregated flow into its fixed-width wire record.

use crate::flow_data::{FlowKey, FlowRecord};
use crate::ipfix::encode_fields_from_template;
use crate::netflow5::{Netflow5Record, RECORD_LEN};
use crate::template::{Template, TemplateManager};
use flow_config::ExportProtocol;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum RecordEncoder {
    /// 48-byte NetFlow v5 record
    Netflow5,
    /// IPFIX data record laid out by the template
    Ipfix(Arc<Template>),
}

impl RecordEncoder {
    pub fn new(templates: &TemplateManager) -> Self {
        match templates.protocol() {
            ExportProtocol::Netflow5 => RecordEncoder::Netflow5,
            ExportProtocol::Ipfix => RecordEncoder::Ipfix(templates.build()),
        }
    }

    /// Every record this encoder produces is exactly this long.
    pub fn record_length(&self) -> usize {
        match self {
            RecordEncoder::Netflow5 => RECORD_LEN,
            RecordEncoder::Ipfix(template) => template.record_length(),
        }
    }

    /// Appends the encoded record to `target`.
    pub fn encode_into(&self, key: &FlowKey, record: &FlowRecord, target: &mut Vec<u8>) {
        match self {
            RecordEncoder::Netflow5 => Netflow5Record::from_flow(key, record).write_to(target),
            RecordEncoder::Ipfix(template) => encode_fields_from_template(template, key, record, target),
        }
    }

    pub fn encode(&self, key: &FlowKey, record: &FlowRecord) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.record_length());
        self.encode_into(key, record, &mut bytes);
        bytes
    }
}
