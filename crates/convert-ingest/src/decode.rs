//! Text decoding with ordered encoding fallback.

use crate::error::{IngestError, Result};
use crate::format::{EncodingFallback, TextEncoding};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decoded text and the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decodes `bytes` with `primary`, then every fallback encoding in order.
///
/// A candidate is rejected on the first malformed sequence; nothing is
/// replaced. A leading byte order mark is dropped.
pub fn decode_text(
    file: &str,
    bytes: &[u8],
    primary: TextEncoding,
    fallback: &EncodingFallback,
) -> Result<DecodedText> {
    let candidates = fallback.candidates(primary);
    let mut tried: Vec<&'static encoding_rs::Encoding> = Vec::new();

    for encoding in &candidates {
        let codec = encoding.codec();
        if tried.contains(&codec) {
            continue;
        }
        tried.push(codec);

        let input = if codec == encoding_rs::UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };
        match codec.decode_without_bom_handling_and_without_replacement(input) {
            Some(text) => {
                if *encoding != primary {
                    tracing::info!(
                        file,
                        primary = primary.label(),
                        encoding = encoding.label(),
                        "decoded with fallback encoding"
                    );
                }
                let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_string();
                return Ok(DecodedText {
                    text,
                    encoding: *encoding,
                });
            }
            None => {
                tracing::debug!(file, encoding = encoding.label(), "decode attempt failed");
            }
        }
    }

    Err(IngestError::UnsupportedEncoding {
        file: file.to_string(),
        tried: candidates
            .iter()
            .map(|encoding| encoding.label())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sjis(text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(text);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn falls_back_to_shift_jis() {
        let decoded =
            decode_text("a.csv", &sjis("氏名,性別"), TextEncoding::Utf8, &EncodingFallback::default())
                .unwrap();
        assert_eq!(decoded.text, "氏名,性別");
        assert_eq!(decoded.encoding, TextEncoding::ShiftJis);
    }

    #[test]
    fn strips_utf8_bom() {
        let decoded = decode_text(
            "a.csv",
            b"\xEF\xBB\xBFname",
            TextEncoding::Utf8,
            &EncodingFallback::default(),
        )
        .unwrap();
        assert_eq!(decoded.text, "name");
    }

    #[test]
    fn fails_when_every_candidate_fails() {
        let fallback = EncodingFallback::new(vec![TextEncoding::Utf8]);
        let err = decode_text("a.csv", &[0xFF, 0xFE, 0x81], TextEncoding::Utf8, &fallback)
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn latin1_accepts_anything() {
        let decoded = decode_text(
            "a.csv",
            &[0x63, 0x61, 0x66, 0xE9],
            TextEncoding::Utf8,
            &EncodingFallback::new(vec![TextEncoding::Iso8859_1]),
        )
        .unwrap();
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.encoding, TextEncoding::Iso8859_1);
    }
}
