use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::utils::SiteError;

/// Encode text for the contents API: base64 over its UTF-8 bytes
pub fn encode_content(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Inverse of [`encode_content`]
///
/// The API wraps base64 payloads across lines, so ASCII whitespace is ignored.
/// Bytes that do not form valid UTF-8 are a protocol error.
pub fn decode_content(encoded: &str) -> Result<String, SiteError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SiteError::Protocol(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| SiteError::Protocol(format!("Content is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "<html></html>",
        "Café crème brûlée",
        "🚀 Launch day 🎉👩‍💻",
        "日本語のページ",
        "مرحبا بالعالم",
        "Ελληνικά και русский",
        "e\u{301} combining acute",
        "tabs\tand\nnewlines\r\n",
        "\u{10FFFF} edge of the code space",
    ];

    #[test]
    fn test_roundtrip_unicode() {
        for sample in SAMPLES {
            let encoded = encode_content(sample);
            assert!(encoded.is_ascii());
            assert_eq!(decode_content(&encoded).unwrap(), *sample, "sample {:?}", sample);
        }
    }

    #[test]
    fn test_matches_utf8_bytes() {
        // "é" is C3 A9 in UTF-8
        assert_eq!(encode_content("é"), "w6k=");
        assert_eq!(encode_content("hi"), "aGk=");
    }

    #[test]
    fn test_decode_ignores_line_wrapping() {
        let long = "🌍 ".repeat(40);
        let encoded = encode_content(&long);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(wrapped.contains('\n'));
        assert_eq!(decode_content(&format!("{}\n", wrapped)).unwrap(), long);
    }

    #[test]
    fn test_decode_rejects_invalid_input() {
        assert!(matches!(decode_content("not base64!!"), Err(SiteError::Protocol(_))));
        // 0xFF 0xFE is not UTF-8
        let bad = BASE64.encode([0xFFu8, 0xFE]);
        assert!(matches!(decode_content(&bad), Err(SiteError::Protocol(_))));
    }
}
