//! Windows-1252, the legacy single-byte codepage used by every Aurora text payload
//!
//! Bytes 0x00-0x7F and 0xA0-0xFF map straight onto Unicode. The 0x80-0x9F
//! block is looked up in [`HIGH_BLOCK`]; its five holes decode to U+FFFD.

use std::borrow::Cow;

/// Replacement for bytes the codepage leaves undefined.
pub const PLACEHOLDER: char = '\u{FFFD}';

/// Unicode scalars for 0x80..=0x9F; `None` marks undefined slots.
const HIGH_BLOCK: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

/// Decode legacy codepage bytes.
///
/// Never fails: undefined bytes become [`PLACEHOLDER`] and are reported at
/// trace level. Pure ASCII input is borrowed without copying.
#[must_use]
pub fn decode_cp1252(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_ascii() {
        // ASCII is valid UTF-8
        return Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default());
    }

    let mut out = String::with_capacity(bytes.len() + bytes.len() / 2);
    for (pos, &b) in bytes.iter().enumerate() {
        match b {
            0x80..=0x9F => {
                if let Some(c) = HIGH_BLOCK[usize::from(b - 0x80)] {
                    out.push(c);
                } else {
                    tracing::trace!("undefined cp1252 byte {b:#04x} at {pos}, substituting placeholder");
                    out.push(PLACEHOLDER);
                }
            }
            _ => out.push(char::from(b)),
        }
    }
    Cow::Owned(out)
}

/// Encode text into legacy codepage bytes, mapping unrepresentable
/// characters to `?`.
#[must_use]
pub fn encode_cp1252(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn encode_char(c: char) -> u8 {
    let code = u32::from(c);
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return code as u8;
    }
    HIGH_BLOCK
        .iter()
        .position(|slot| *slot == Some(c))
        .map_or(b'?', |i| 0x80 + i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_borrowed() {
        assert!(matches!(decode_cp1252(b"nw_it_gold001"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_high_block() {
        assert_eq!(decode_cp1252(&[0x80, 0x93, 0x94]), "\u{20AC}\u{201C}\u{201D}");
        assert_eq!(encode_cp1252("\u{20AC}\u{2014}"), vec![0x80, 0x97]);
    }

    #[test]
    fn test_latin1_range() {
        assert_eq!(decode_cp1252(&[0x43, 0x61, 0x66, 0xE9]), "Caf\u{e9}");
        assert_eq!(encode_cp1252("Caf\u{e9}"), vec![0x43, 0x61, 0x66, 0xE9]);
    }

    #[test]
    fn test_undefined_bytes_never_fail() {
        let text = decode_cp1252(&[b'a', 0x81, b'b', 0x9D]);
        assert_eq!(text, format!("a{PLACEHOLDER}b{PLACEHOLDER}"));
    }

    #[test]
    fn test_unrepresentable_becomes_question_mark() {
        assert_eq!(encode_cp1252("\u{4E2D}x"), b"?x".to_vec());
    }
}
