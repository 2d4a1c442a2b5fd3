use thiserror::Error;
use tracing::error;

/// `read_hex_bytes` converts a hex dump (e.g. `474554202f`) into raw
/// bytes. Whitespace is ignored and an optional `0x` prefix is accepted,
/// which matches what most capture tools print for packet payloads.
///
/// ## Parameters
///
/// * `s`: the string to attempt to parse.
///
/// ## Returns
///
/// Either the decoded bytes or a `HexParseError`.
///
/// ## Example
///
/// ```rust
/// use flow_utils::hex_string::read_hex_bytes;
/// assert_eq!(read_hex_bytes("0x4745 54").unwrap(), b"GET".to_vec());
/// ```
pub fn read_hex_bytes(s: &str) -> Result<Vec<u8>, HexParseError> {
  let cleaned: String = s
    .trim()
    .trim_start_matches("0x")
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  if cleaned.len() % 2 != 0 {
    error!("Hex payload has an odd number of digits ({})", cleaned.len());
    return Err(HexParseError::OddLength);
  }

  let mut result = Vec::with_capacity(cleaned.len() / 2);
  for pair in cleaned.as_bytes().chunks(2) {
    let digits = std::str::from_utf8(pair).map_err(|_| HexParseError::ParseError)?;
    match u8::from_str_radix(digits, 16) {
      Ok(byte) => result.push(byte),
      Err(e) => {
        error!("Unable to convert {digits} to a byte");
        error!("{:?}", e);
        return Err(HexParseError::ParseError);
      }
    }
  }
  Ok(result)
}

/// `HexParseError` is an error type defining what can go wrong
/// decoding a hex dump into bytes.
#[derive(Error, Debug)]
pub enum HexParseError {
  /// The hex string could not be decoded
  #[error("Unable to decode string into valid hex")]
  ParseError,
  /// Hex dumps must contain whole bytes
  #[error("Hex string has an odd number of digits")]
  OddLength,
}
