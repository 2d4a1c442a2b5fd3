//! IPFIX template layout: which standard information elements to export
//! and how the vendor-specific HTTP fields are numbered.

use serde::{Deserialize, Serialize};

/// Standard IANA information elements the exporter knows how to fill.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StandardField {
    SourceIpv4Address,
    DestinationIpv4Address,
    SourceIpv6Address,
    DestinationIpv6Address,
    SourceTransportPort,
    DestinationTransportPort,
    ProtocolIdentifier,
    TcpControlBits,
    PacketDeltaCount,
    OctetDeltaCount,
    FlowStartSysUpTime,
    FlowEndSysUpTime,
}

/// Identifier and fixed width of one vendor field.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EnterpriseFieldConfig {
    /// Element id without the enterprise bit; it is added on the wire.
    pub id: u16,
    /// Fixed byte length. Longer text is truncated, shorter text padded.
    pub length: u16,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct EnterpriseConfig {
    /// Private Enterprise Number sent with every vendor field.
    pub pen: u32,
    pub http_url: EnterpriseFieldConfig,
    pub http_user_agent: EnterpriseFieldConfig,
    pub http_host: EnterpriseFieldConfig,
}

impl Default for EnterpriseConfig {
    fn default() -> Self {
        Self {
            pen: 35632,
            http_url: EnterpriseFieldConfig { id: 100, length: 128 },
            http_user_agent: EnterpriseFieldConfig { id: 101, length: 128 },
            http_host: EnterpriseFieldConfig { id: 102, length: 64 },
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct IpfixConfig {
    /// Template id used for data sets. Must be 256 or above.
    pub template_id: u16,

    /// Standard elements, in wire order.
    pub fields: Vec<StandardField>,

    /// Append the three vendor HTTP fields after the standard ones.
    pub include_http_fields: bool,

    /// Vendor field numbering.
    pub enterprise: EnterpriseConfig,
}

impl Default for IpfixConfig {
    fn default() -> Self {
        Self {
            template_id: 256,
            fields: vec![
                StandardField::SourceIpv4Address,
                StandardField::DestinationIpv4Address,
                StandardField::SourceTransportPort,
                StandardField::DestinationTransportPort,
                StandardField::ProtocolIdentifier,
                StandardField::TcpControlBits,
                StandardField::PacketDeltaCount,
                StandardField::OctetDeltaCount,
            ],
            include_http_fields: true,
            enterprise: EnterpriseConfig::default(),
        }
    }
}

impl IpfixConfig {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.template_id < 256 {
            return Err(format!(
                "IPFIX template_id must be 256 or above, {} configured",
                self.template_id
            ));
        }
        if self.fields.is_empty() && !self.include_http_fields {
            return Err("IPFIX template must contain at least one field".to_string());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].contains(field) {
                return Err(format!("IPFIX field {field:?} is listed more than once"));
            }
        }
        if self.include_http_fields {
            let vendor = [
                ("http_url", self.enterprise.http_url),
                ("http_user_agent", self.enterprise.http_user_agent),
                ("http_host", self.enterprise.http_host),
            ];
            for (name, field) in vendor.iter() {
                if field.id & 0x8000 != 0 {
                    return Err(format!(
                        "Enterprise field {name} id {} must be below 32768; the enterprise bit is added automatically",
                        field.id
                    ));
                }
                if field.length == 0 {
                    return Err(format!("Enterprise field {name} needs a non-zero length"));
                }
            }
        }
        Ok(())
    }
}
