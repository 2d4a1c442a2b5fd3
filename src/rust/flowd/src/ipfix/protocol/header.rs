/// Bytes in the message header
pub const HEADER_LEN: usize = 16;

/// Bytes in a set header
pub const SET_HEADER_LEN: usize = 4;

/// IPFIX message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpfixHeader {
    pub version: u16,
    /// Total message length, header included
    pub length: u16,
    /// Seconds since the UNIX epoch
    pub export_time: u32,
    pub sequence: u32,
    pub domain_id: u32,
}

impl IpfixHeader {
    pub fn new(length: u16, export_time: u32, sequence: u32, domain_id: u32) -> Self {
        Self {
            version: 10,
            length,
            export_time,
            sequence,
            domain_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..2].copy_from_slice(&self.version.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.length.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.export_time.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.sequence.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.domain_id.to_be_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            version: u16::from_be_bytes([bytes[0], bytes[1]]),
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
            export_time: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            sequence: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            domain_id: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}

/// Header in front of every template or data set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetHeader {
    pub set_id: u16,
    /// Set length, this header included
    pub length: u16,
}

impl SetHeader {
    pub fn to_bytes(&self) -> [u8; SET_HEADER_LEN] {
        let mut bytes = [0u8; SET_HEADER_LEN];
        bytes[0..2].copy_from_slice(&self.set_id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.length.to_be_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < SET_HEADER_LEN {
            return None;
        }
        Some(Self {
            set_id: u16::from_be_bytes([bytes[0], bytes[1]]),
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }
}
