//! Locates the textual HTTP request line and the `Host`/`User-Agent`
//! headers in a TCP payload. Nothing more: no reassembly, no decoding.

use serde::Deserialize;

/// Upper bound on any extracted text field, in bytes.
pub const MAX_EXTRACTED_TEXT: usize = 1024;

/// HTTP request attributes attached to a flow. Empty strings mean
/// "not observed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpFields {
    pub url: String,
    pub user_agent: String,
    pub host: String,
}

impl HttpFields {
    pub fn is_empty(&self) -> bool {
        self.url.is_empty() && self.user_agent.is_empty() && self.host.is_empty()
    }

    /// Copies fields from `other` only where this record has nothing yet.
    /// The first observed value always wins.
    pub fn fill_missing(&mut self, other: HttpFields) {
        if self.url.is_empty() {
            self.url = other.url;
        }
        if self.user_agent.is_empty() {
            self.user_agent = other.user_agent;
        }
        if self.host.is_empty() {
            self.host = other.host;
        }
    }

    /// Clamps every field to [`MAX_EXTRACTED_TEXT`] bytes.
    pub(crate) fn bounded(mut self) -> Self {
        for field in [&mut self.url, &mut self.user_agent, &mut self.host] {
            let keep = truncate_at_char_boundary(field, MAX_EXTRACTED_TEXT).len();
            field.truncate(keep);
        }
        self
    }
}

/// Scans a payload for an HTTP request. Returns `None` when neither a
/// request line nor any of the interesting headers is present.
pub fn extract_http_fields(payload: &[u8]) -> Option<HttpFields> {
    let text = String::from_utf8_lossy(payload);
    let mut fields = HttpFields::default();
    for line in text.split("\r\n") {
        if line.starts_with("GET") || line.starts_with("POST") {
            if let Some(url) = line.split_whitespace().nth(1) {
                fields.url = url.to_string();
            }
        } else if let Some(value) = header_value(line, "host:") {
            fields.host = value.to_string();
        } else if let Some(value) = header_value(line, "user-agent:") {
            fields.user_agent = value.to_string();
        }
    }
    let fields = fields.bounded();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let prefix = line.get(..name.len())?;
    if prefix.eq_ignore_ascii_case(name) {
        Some(line[name.len()..].trim())
    } else {
        None
    }
}

/// The longest prefix of `s` that fits in `max` bytes without splitting
/// a UTF-8 character.
pub fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
