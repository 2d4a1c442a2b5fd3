use super::{Element, Template, TemplateError, TemplateField};
use crate::flow_data::FlowKey;
use flow_config::{Config, ExportProtocol, IpfixConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Owns the record layout for one exporter and decides when it has to
/// be announced again.
#[derive(Debug, Clone)]
pub struct TemplateManager {
    protocol: ExportProtocol,
    template: Arc<Template>,
}

impl TemplateManager {
    /// The fixed NetFlow v5 layout. It is never sent on the wire; it
    /// exists so the v5 record can be checked against it.
    pub fn netflow5() -> Self {
        use Element::*;
        let fields = [
            (SourceIpv4Address, 4),
            (DestinationIpv4Address, 4),
            (IpNextHopIpv4Address, 4),
            (IngressInterface, 2),
            (EgressInterface, 2),
            (PacketDeltaCount, 4),
            (OctetDeltaCount, 4),
            (FlowStartSysUpTime, 4),
            (FlowEndSysUpTime, 4),
            (SourceTransportPort, 2),
            (DestinationTransportPort, 2),
            (PaddingOctets, 1),
            (TcpControlBits, 1),
            (ProtocolIdentifier, 1),
            (IpClassOfService, 1),
            (BgpSourceAsNumber, 2),
            (BgpDestinationAsNumber, 2),
            (SourceIpv4PrefixLength, 1),
            (DestinationIpv4PrefixLength, 1),
            (PaddingOctets, 2),
        ]
        .into_iter()
        .map(|(element, length)| TemplateField::standard(element, length))
        .collect();

        Self {
            protocol: ExportProtocol::Netflow5,
            template: Arc::new(Template::fixed(0, fields)),
        }
    }

    /// Builds the IPFIX layout: configured standard elements in order,
    /// then the vendor HTTP fields when enabled.
    pub fn ipfix(config: &IpfixConfig) -> Result<Self, TemplateError> {
        let mut fields: Vec<TemplateField> = config
            .fields
            .iter()
            .map(|f| {
                let element = Element::from(*f);
                TemplateField::standard(element, element.default_length())
            })
            .collect();

        if config.include_http_fields {
            let enterprise = &config.enterprise;
            let vendor = [
                (Element::HttpUrl, enterprise.http_url),
                (Element::HttpUserAgent, enterprise.http_user_agent),
                (Element::HttpHost, enterprise.http_host),
            ];
            for (element, field) in vendor {
                fields.push(TemplateField::vendor(element, field.id, field.length, enterprise.pen));
            }
        }

        Ok(Self {
            protocol: ExportProtocol::Ipfix,
            template: Arc::new(Template::new(config.template_id, fields)?),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        match config.exporter.protocol {
            ExportProtocol::Netflow5 => Ok(Self::netflow5()),
            ExportProtocol::Ipfix => Self::ipfix(&config.ipfix),
        }
    }

    pub fn protocol(&self) -> ExportProtocol {
        self.protocol
    }

    /// The published, read-only layout.
    pub fn build(&self) -> Arc<Template> {
        self.template.clone()
    }

    /// Only IPFIX collectors need to be told the layout.
    pub fn needs_announcement(&self) -> bool {
        self.protocol == ExportProtocol::Ipfix
    }

    /// True when no announcement has happened yet, or `interval` has
    /// passed since the last one. Data traffic in between is irrelevant.
    pub fn should_reannounce(now: Instant, last_announce: Option<Instant>, interval: Duration) -> bool {
        match last_announce {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        }
    }

    /// Can a flow be represented by this layout? NetFlow v5 only carries
    /// IPv4. IPFIX layouts carry the families they have address fields
    /// for, or any family when they have none.
    pub fn accepts(&self, key: &FlowKey) -> bool {
        match self.protocol {
            ExportProtocol::Netflow5 => key.is_v4(),
            ExportProtocol::Ipfix => {
                let (v4, v6) = self.template.address_families();
                match (v4, v6) {
                    (false, false) => true,
                    _ => (v4 && key.is_v4()) || (v6 && key.is_v6()),
                }
            }
        }
    }
}
