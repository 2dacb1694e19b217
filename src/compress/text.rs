// Text mode: fixed dictionary substitution of common short fragments.
//
// Codes are byte values that never appear in well-formed UTF-8, so ordinary
// text needs no escaping. Any literal byte that does fall in the reserved set
// (a code or the escape itself) is written as TEXT_ESCAPE followed by the byte.

use super::CompressError;

pub const TEXT_ESCAPE: u8 = 0xFF;

/// Code bytes, parallel to `WORDS`.
const CODES: [u8; 12] = [
    0xC0, 0xC1, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE,
];

/// Dictionary fragments, longest first so matching is longest-match-first.
const WORDS: [&[u8]; 12] = [
    b"the", b"and", b"ing", b"ion", b"ent", b"her", b"th", b"he", b"in", b"er", b"an", b"re",
];

#[inline]
fn code_index(byte: u8) -> Option<usize> {
    CODES.iter().position(|&c| c == byte)
}

#[inline]
fn is_reserved(byte: u8) -> bool {
    byte == TEXT_ESCAPE || code_index(byte).is_some()
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    'scan: while i < data.len() {
        let rest = &data[i..];
        for (word, &code) in WORDS.iter().zip(CODES.iter()) {
            if rest.starts_with(word) {
                out.push(code);
                i += word.len();
                continue 'scan;
            }
        }
        let byte = data[i];
        if is_reserved(byte) {
            out.push(TEXT_ESCAPE);
        }
        out.push(byte);
        i += 1;
    }
    out
}

pub fn decode(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 2);
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        if byte == TEXT_ESCAPE {
            let literal = *data
                .get(i + 1)
                .ok_or_else(|| CompressError::corrupt("text", i, "truncated escape"))?;
            out.push(literal);
            i += 2;
        } else if let Some(idx) = code_index(byte) {
            out.extend_from_slice(WORDS[idx]);
            i += 1;
        } else {
            out.push(byte);
            i += 1;
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_words_shrink() {
        let data = b"the thing and the other";
        let enc = encode(data);
        assert!(enc.len() < data.len());
        assert_eq!(decode(&enc).unwrap(), data);
    }

    #[test]
    fn longest_match_wins() {
        // "the" must be preferred over "th" + "e".
        assert_eq!(encode(b"the"), vec![0xC0]);
        assert_eq!(encode(b"th"), vec![CODES[6]]);
    }

    #[test]
    fn short_text_without_matches_passes_through() {
        assert_eq!(encode(b"a cat"), b"a cat".to_vec());
    }

    #[test]
    fn utf8_text_roundtrips() {
        let data = "naïve café, 東京, the end".as_bytes();
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn reserved_bytes_are_escaped() {
        let data = [0xC0, 0xFF, 0xFE, b'x'];
        let enc = encode(&data);
        assert_eq!(enc, vec![0xFF, 0xC0, 0xFF, 0xFF, 0xFF, 0xFE, b'x']);
        assert_eq!(decode(&enc).unwrap(), data);
    }

    #[test]
    fn truncated_escape_is_corrupt() {
        assert!(decode(&[b'a', TEXT_ESCAPE]).is_err());
    }

    #[test]
    fn every_byte_value_roundtrips() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }
}
