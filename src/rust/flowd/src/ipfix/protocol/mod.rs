//! Protocol definitions for IPFIX messages.

pub mod field_encoder;
mod header;
mod template_set;

pub use field_encoder::encode_fields_from_template;
pub use header::{IpfixHeader, SetHeader, HEADER_LEN, SET_HEADER_LEN};
pub use template_set::template_set;

/// Set id of a template set
pub const SET_ID_TEMPLATE: u16 = 2;

fn add_field(bytes: &mut Vec<u8>, field_type: u16, field_length: u16) {
    bytes.extend_from_slice(field_type.to_be_bytes().as_ref());
    bytes.extend_from_slice(field_length.to_be_bytes().as_ref());
}
