//! Wire text encoding for characteristic payloads.
//!
//! Raw GATT payloads cross the transport boundary as base64 text. The decode
//! path turns that text back into bytes and renders them as a human-readable
//! string; invalid UTF-8 sequences are replaced, so the same bytes always
//! produce the same string.

use base64::engine::general_purpose::STANDARD;
use base64::{DecodeError, Engine};

/// Encodes a raw payload into its wire text form
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes a wire text payload into display text
pub fn decode_payload(wire: &str) -> Result<String, DecodeError> {
    let bytes = STANDARD.decode(wire)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_deterministic() {
        let payload = b"GM-B2100 battery: 87%";
        let wire = encode_payload(payload);
        let first = decode_payload(&wire).unwrap();
        let second = decode_payload(&wire).unwrap();
        assert_eq!(first, "GM-B2100 battery: 87%");
        assert_eq!(first, second);
    }

    #[test]
    fn non_utf8_bytes_decode_to_a_stable_string() {
        let payload = [0xff, 0xfe, b'o', b'k'];
        let wire = encode_payload(&payload);
        let first = decode_payload(&wire).unwrap();
        let second = decode_payload(&wire).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with("ok"));
    }

    #[test]
    fn garbage_wire_text_is_rejected() {
        assert!(decode_payload("not base64 !!").is_err());
    }
}
