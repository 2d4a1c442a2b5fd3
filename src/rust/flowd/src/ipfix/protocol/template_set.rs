use super::{add_field, SetHeader, SET_HEADER_LEN, SET_ID_TEMPLATE};
use crate::template::Template;

/// Builds a complete template set (set header included) announcing
/// `template`.
pub fn template_set(template: &Template) -> Vec<u8> {
    let fields = template.fields();
    let length = SET_HEADER_LEN + 4 + fields.iter().map(|f| f.specifier_length()).sum::<usize>();

    let mut bytes = Vec::with_capacity(length);
    let header = SetHeader {
        set_id: SET_ID_TEMPLATE,
        length: length as u16,
    };
    bytes.extend_from_slice(&header.to_bytes());

    // Template record header
    bytes.extend_from_slice(&template.id().to_be_bytes());
    bytes.extend_from_slice(&(fields.len() as u16).to_be_bytes());

    for field in fields.iter() {
        add_field(&mut bytes, field.wire_id(), field.length);
        if let Some(pen) = field.enterprise {
            bytes.extend_from_slice(&pen.to_be_bytes());
        }
    }

    bytes
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::template::TemplateManager;
    use flow_config::IpfixConfig;

    #[test]
    fn default_template_set() {
        let template = TemplateManager::ipfix(&IpfixConfig::default()).unwrap().build();
        let bytes = template_set(&template);
        // 4 set header + 4 record header + 8 standard * 4 + 3 vendor * 8
        assert_eq!(bytes.len(), 64);
        let header = SetHeader::decode(&bytes).unwrap();
        assert_eq!(header.set_id, 2);
        assert_eq!(header.length as usize, bytes.len());
        assert_eq!(&bytes[4..6], &256u16.to_be_bytes());
        assert_eq!(&bytes[6..8], &11u16.to_be_bytes());
        // First field: sourceIPv4Address, 4 bytes
        assert_eq!(&bytes[8..12], &[0, 8, 0, 4]);
        // First vendor field: id 100 with the enterprise bit, 128 bytes, PEN 35632
        assert_eq!(&bytes[40..44], &[0x80, 100, 0, 128]);
        assert_eq!(&bytes[44..48], &35632u32.to_be_bytes());
    }
}
