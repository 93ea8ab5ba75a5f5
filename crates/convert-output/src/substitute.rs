//! Replacement text for characters a target encoding cannot represent.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use convert_ingest::TextEncoding;
use encoding_rs::{EncoderResult, Encoding};

static DEFAULT_SUBSTITUTIONS: LazyLock<BTreeMap<char, &'static str>> = LazyLock::new(|| {
    let mut table = BTreeMap::new();
    let circled = [
        '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩', '⑪', '⑫', '⑬', '⑭', '⑮', '⑯', '⑰',
        '⑱', '⑲', '⑳',
    ];
    const NUMBERS: [&str; 20] = [
        "(1)", "(2)", "(3)", "(4)", "(5)", "(6)", "(7)", "(8)", "(9)", "(10)", "(11)", "(12)",
        "(13)", "(14)", "(15)", "(16)", "(17)", "(18)", "(19)", "(20)",
    ];
    table.extend(circled.into_iter().zip(NUMBERS));

    let roman = ['Ⅰ', 'Ⅱ', 'Ⅲ', 'Ⅳ', 'Ⅴ', 'Ⅵ', 'Ⅶ', 'Ⅷ', 'Ⅸ', 'Ⅹ'];
    let small_roman = ['ⅰ', 'ⅱ', 'ⅲ', 'ⅳ', 'ⅴ', 'ⅵ', 'ⅶ', 'ⅷ', 'ⅸ', 'ⅹ'];
    const ROMAN: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];
    const SMALL_ROMAN: [&str; 10] = ["i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x"];
    table.extend(roman.into_iter().zip(ROMAN));
    table.extend(small_roman.into_iter().zip(SMALL_ROMAN));

    table.extend([
        ('㈱', "(株)"),
        ('㈲', "(有)"),
        ('㈹', "(代)"),
        ('№', "No."),
        ('℡', "TEL"),
        ('㍻', "平成"),
        ('㍼', "昭和"),
        ('㋿', "令和"),
        ('～', "~"),
        ('〜', "~"),
        ('−', "-"),
        ('–', "-"),
        ('—', "-"),
        ('―', "-"),
        ('‐', "-"),
        ('‘', "'"),
        ('’', "'"),
        ('“', "\""),
        ('”', "\""),
        ('…', "..."),
        ('\u{00a0}', " "),
    ]);
    table
});

/// Character substitutions applied before encoding CSV output.
///
/// A substitution is used only when the character itself cannot be
/// encoded; representable characters are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: BTreeMap<char, String>,
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SUBSTITUTIONS
                .iter()
                .map(|(from, to)| (*from, (*to).to_string()))
                .collect(),
        }
    }
}

impl SubstitutionTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Default table with `overrides` layered on top.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (char, String)>,
    {
        let mut table = Self::default();
        table.entries.extend(overrides);
        table
    }

    pub fn insert(&mut self, from: char, to: impl Into<String>) {
        self.entries.insert(from, to.into());
    }

    pub fn get(&self, from: char) -> Option<&str> {
        self.entries.get(&from).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the characters of `text` that `encoding` cannot represent.
    pub fn normalize(&self, text: &str, encoding: TextEncoding) -> String {
        let codec = encoding.codec();
        if codec == encoding_rs::UTF_8 {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match self.entries.get(&ch) {
                Some(replacement) if !can_encode(codec, ch) => out.push_str(replacement),
                _ => out.push(ch),
            }
        }
        out
    }
}

fn can_encode(codec: &'static Encoding, ch: char) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, had_errors) = codec.encode(ch.encode_utf8(&mut buf));
    !had_errors
}

/// Encodes `text`, dropping characters the encoding cannot represent.
///
/// Returns the bytes and the number of dropped characters.
pub fn encode_lossy(text: &str, encoding: TextEncoding) -> (Vec<u8>, usize) {
    let codec = encoding.codec();
    if codec == encoding_rs::UTF_8 {
        return (text.as_bytes().to_vec(), 0);
    }
    let mut encoder = codec.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut dropped = 0;
    let mut rest = text;
    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(rest.len())
            .unwrap_or(rest.len() * 4);
        out.reserve(needed);
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut out, true);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => dropped += 1,
        }
    }
    (out, dropped)
}
