//! Support for IPFIX (NetFlow version 10), RFC 7011.
//! Records are fixed-length: HTTP text fields are truncated or
//! zero-padded to their declared length instead of using the
//! variable-length encoding.
mod protocol;
pub use protocol::*;
