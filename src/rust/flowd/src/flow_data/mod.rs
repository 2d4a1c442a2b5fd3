//! Per-flow data: the 5-tuple key, the aggregate record, the packet
//! events that feed it and the table that owns every live flow.

mod flow_key;
mod flow_record;
mod flow_table;
mod http;
mod packet_event;

pub use flow_key::{FlowKey, IPPROTO_ICMP, IPPROTO_SCTP, IPPROTO_TCP, IPPROTO_UDP};
pub use flow_record::FlowRecord;
pub use flow_table::FlowTable;
pub use http::{extract_http_fields, truncate_at_char_boundary, HttpFields, MAX_EXTRACTED_TEXT};
pub use packet_event::PacketEvent;
