use super::field_types::{AddressFamily, Element};
use flow_config::MAX_SAFE_PAYLOAD;
use thiserror::Error;

/// High bit of a 16-bit element id: an enterprise number follows.
pub const ENTERPRISE_BIT: u16 = 0x8000;

/// Largest record that can still share a message with an IPFIX header
/// and a set header.
const MAX_RECORD_LENGTH: usize = MAX_SAFE_PAYLOAD - 16 - 4;

/// One field of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateField {
    pub element: Element,
    /// Element id, without the enterprise bit
    pub id: u16,
    /// Fixed byte length on the wire
    pub length: u16,
    /// Private Enterprise Number for vendor fields
    pub enterprise: Option<u32>,
}

impl TemplateField {
    /// A standard IANA element. Vendor elements need [`TemplateField::vendor`].
    pub fn standard(element: Element, length: u16) -> Self {
        Self {
            element,
            id: element.iana_id().unwrap_or(0),
            length,
            enterprise: None,
        }
    }

    pub fn vendor(element: Element, id: u16, length: u16, pen: u32) -> Self {
        Self {
            element,
            id,
            length,
            enterprise: Some(pen),
        }
    }

    /// The id as written in a template set.
    pub fn wire_id(&self) -> u16 {
        match self.enterprise {
            Some(_) => self.id | ENTERPRISE_BIT,
            None => self.id,
        }
    }

    /// Bytes this field's specifier takes in a template record.
    pub fn specifier_length(&self) -> usize {
        if self.enterprise.is_some() {
            8
        } else {
            4
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("A template needs at least one field")]
    Empty,
    #[error("Field {element:?} cannot be encoded in {length} bytes")]
    UnsupportedLength { element: Element, length: u16 },
    #[error("Field {element:?} has no standard id and no enterprise number")]
    MissingId { element: Element },
    #[error("Element id {0} collides with the enterprise bit")]
    EnterpriseBitInId(u16),
    #[error("Record length of {0} bytes does not fit in a message")]
    RecordTooLarge(usize),
}

/// Immutable record layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: u16,
    fields: Vec<TemplateField>,
}

impl Template {
    /// Builds a template, checking every field can actually be encoded
    /// at its declared length.
    pub fn new(id: u16, fields: Vec<TemplateField>) -> Result<Self, TemplateError> {
        if fields.is_empty() {
            return Err(TemplateError::Empty);
        }
        for field in fields.iter() {
            if field.enterprise.is_none() && field.element.iana_id().is_none() {
                return Err(TemplateError::MissingId { element: field.element });
            }
            if field.id & ENTERPRISE_BIT != 0 {
                return Err(TemplateError::EnterpriseBitInId(field.id));
            }
            if !field.element.accepts_length(field.length) {
                return Err(TemplateError::UnsupportedLength {
                    element: field.element,
                    length: field.length,
                });
            }
        }
        let template = Self { id, fields };
        if template.record_length() > MAX_RECORD_LENGTH {
            return Err(TemplateError::RecordTooLarge(template.record_length()));
        }
        Ok(template)
    }

    /// A layout known to be valid at compile time.
    pub(crate) fn fixed(id: u16, fields: Vec<TemplateField>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    /// Bytes in one encoded data record.
    pub fn record_length(&self) -> usize {
        self.fields.iter().map(|f| f.length as usize).sum()
    }

    /// Does any field carry HTTP text?
    pub fn has_text_fields(&self) -> bool {
        self.fields.iter().any(|f| f.element.iana_id().is_none())
    }

    pub(crate) fn address_families(&self) -> (bool, bool) {
        let v4 = self
            .fields
            .iter()
            .any(|f| f.element.address_family() == Some(AddressFamily::V4));
        let v6 = self
            .fields
            .iter()
            .any(|f| f.element.address_family() == Some(AddressFamily::V6));
        (v4, v6)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vendor_fields_set_the_high_bit() {
        let field = TemplateField::vendor(Element::HttpUrl, 100, 128, 35632);
        assert_eq!(field.wire_id(), 0x8064);
        assert_eq!(field.specifier_length(), 8);
        let field = TemplateField::standard(Element::SourceTransportPort, 2);
        assert_eq!(field.wire_id(), 7);
        assert_eq!(field.specifier_length(), 4);
    }

    #[test]
    fn record_length_is_field_sum() {
        let template = Template::new(
            256,
            vec![
                TemplateField::standard(Element::SourceIpv4Address, 4),
                TemplateField::standard(Element::PacketDeltaCount, 8),
                TemplateField::vendor(Element::HttpHost, 102, 64, 35632),
            ],
        )
        .unwrap();
        assert_eq!(template.record_length(), 76);
        assert!(template.has_text_fields());
    }

    #[test]
    fn bad_templates() {
        assert_eq!(Template::new(256, vec![]), Err(TemplateError::Empty));
        assert_eq!(
            Template::new(256, vec![TemplateField::standard(Element::SourceIpv4Address, 16)]),
            Err(TemplateError::UnsupportedLength {
                element: Element::SourceIpv4Address,
                length: 16
            })
        );
        assert_eq!(
            Template::new(256, vec![TemplateField::standard(Element::HttpUrl, 16)]),
            Err(TemplateError::MissingId { element: Element::HttpUrl })
        );
        assert_eq!(
            Template::new(256, vec![TemplateField::vendor(Element::HttpUrl, 0x8001, 16, 1)]),
            Err(TemplateError::EnterpriseBitInId(0x8001))
        );
        assert!(matches!(
            Template::new(256, vec![TemplateField::vendor(Element::HttpUrl, 1, 65_381, 1)]),
            Err(TemplateError::RecordTooLarge(65_381))
        ));
        assert!(Template::new(256, vec![TemplateField::vendor(Element::HttpUrl, 1, 65_380, 1)]).is_ok());
    }
}
