//! Utility functions for encoding datatypes in a consistent way across the `keyward` crates with
//! a mind on the encodings actually seen in the webauthn ecosystem.

use data_encoding::{Specification, BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD};

/// Convert bytes to base64 without padding
pub fn base64(data: &[u8]) -> String {
    BASE64_NOPAD.encode(data)
}

/// Convert bytes to padded base64, the form used for DER certificates in metadata statements.
pub fn base64_padded(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Convert bytes to base64url without padding
pub fn base64url(data: &[u8]) -> String {
    BASE64URL_NOPAD.encode(data)
}

/// Try parsing from base64 with or without padding
pub fn try_from_base64(input: &str) -> Option<Vec<u8>> {
    // SAFETY: the BASE64 specification always defines a padding character.
    let padding = BASE64.specification().padding.unwrap();
    let sane_string = input.trim_end_matches(padding);
    BASE64_NOPAD.decode(sane_string.as_bytes()).ok()
}

/// Try parsing from base64url with or without padding
pub fn try_from_base64url(input: &str) -> Option<Vec<u8>> {
    let specs = BASE64URL.specification();
    // SAFETY: the BASE64URL specification always defines a padding character.
    let padding = specs.padding.unwrap();
    let specs = Specification {
        check_trailing_bits: false,
        padding: None,
        ..specs
    };
    let encoding = specs.encoding().ok()?;
    let sane_string = input.trim_end_matches(padding);
    encoding.decode(sane_string.as_bytes()).ok()
}

/// Rewrite a base64url segment into padded standard base64: `-` becomes `+`, `_` becomes `/` and
/// `=` is appended until the length is a multiple of four.
///
/// Metadata TOC tokens are not consistent about padding, this gives every segment a single shape
/// before it is decoded.
pub fn normalize_base64url(segment: &str) -> String {
    let mut normalized: String = segment
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    normalized
}
