//! Byte-level decoding of plain text input.

use chardetng::EncodingDetector;

/// Decode file bytes to text.
///
/// A byte order mark selects UTF-8, UTF-16LE or UTF-16BE. Without one, valid
/// UTF-8 is kept as is and anything else is decoded with the legacy encoding
/// the detector guesses. Bytes that encoding cannot map become U+FFFD.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return decode_utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => decode_detected(bytes),
    }
}

fn decode_detected(bytes: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, false);
    log::info!("Input is not UTF-8; decoding as {}", encoding.name());

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        log::warn!(
            "Input has bytes not valid in {}; replacing them",
            encoding.name()
        );
    }
    text.into_owned()
}

fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            log::warn!(
                "Input is not valid UTF-8 (first error at byte {}); replacing invalid sequences",
                e.valid_up_to()
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    if bytes.len() % 2 != 0 {
        log::warn!("UTF-16 input has an odd byte count; dropping the trailing byte");
    }
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    let mut replaced = false;
    let text = char::decode_utf16(units)
        .map(|c| {
            c.unwrap_or_else(|_| {
                replaced = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();
    if replaced {
        log::warn!("Input contains unpaired UTF-16 surrogates; replacing them");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        assert_eq!(decode_text("Olá mundo.".as_bytes()), "Olá mundo.");
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Hello.");
        assert_eq!(decode_text(&bytes), "Hello.");
    }

    #[test]
    fn test_utf16_le_and_be() {
        let mut le = vec![0xFF, 0xFE];
        let mut be = vec![0xFE, 0xFF];
        for unit in "Hé.".encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&le), "Hé.");
        assert_eq!(decode_text(&be), "Hé.");
    }

    #[test]
    fn test_invalid_utf8_after_bom_is_lossy() {
        let bytes = [0xEF, 0xBB, 0xBF, b'a', 0xFF, b'b'];
        assert_eq!(decode_text(&bytes), "a\u{FFFD}b");
    }

    #[test]
    fn test_latin1_detected() {
        assert_eq!(decode_text(b"Caf\xe9 d\xe9j\xe0 vu."), "Café déjà vu.");

        let text = "Le garçon était très fâché, mais sa sœur a ri à côté de l'église.";
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(text);
        assert!(!unmappable);
        assert_eq!(decode_text(&bytes), text);
    }

    #[test]
    fn test_undetectable_bytes_never_fail() {
        let text = decode_text(&[b'a', 0x81, 0x8D, 0x8F, b'b']);
        assert!(text.starts_with('a'));
        assert!(text.ends_with('b'));
    }
}
