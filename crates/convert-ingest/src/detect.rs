//! Container, delimiter and encoding detection.

use crate::decode::decode_text;
use crate::error::Result;
use crate::format::{Container, EncodingFallback, FileFormatId, FormatSpec, TextEncoding};
use crate::source::SourceFile;

/// Delimiter candidates in tie-break order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

const MIME_TABLE: &[(&str, Container, Option<u8>)] = &[
    ("text/csv", Container::Csv, None),
    ("application/csv", Container::Csv, None),
    ("text/tab-separated-values", Container::Csv, Some(b'\t')),
    ("application/json", Container::Json, None),
    ("text/json", Container::Json, None),
    ("application/xml", Container::Xml, None),
    ("text/xml", Container::Xml, None),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Container::Excel,
        None,
    ),
    ("application/vnd.ms-excel", Container::Excel, None),
    ("application/pdf", Container::Pdf, None),
];

const EXTENSION_TABLE: &[(&str, Container, Option<u8>)] = &[
    ("csv", Container::Csv, None),
    ("txt", Container::Csv, None),
    ("tsv", Container::Csv, Some(b'\t')),
    ("json", Container::Json, None),
    ("xml", Container::Xml, None),
    ("xlsx", Container::Excel, None),
    ("xlsm", Container::Excel, None),
    ("xls", Container::Excel, None),
    ("pdf", Container::Pdf, None),
];

/// What the caller knows about a file besides its bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatHint {
    pub format_id: Option<FileFormatId>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl FormatHint {
    pub fn for_file(file: &SourceFile) -> Self {
        Self {
            format_id: None,
            content_type: file.content_type.clone(),
            file_name: Some(file.name.clone()),
        }
    }

    pub fn with_format_id(mut self, format_id: Option<FileFormatId>) -> Self {
        self.format_id = format_id;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatDetector {
    fallback: EncodingFallback,
}

impl FormatDetector {
    pub fn new(fallback: EncodingFallback) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &EncodingFallback {
        &self.fallback
    }

    /// Resolves the container, delimiter and primary encoding of a file.
    ///
    /// The container comes from the format id, else the MIME type, else the
    /// file extension, else the leading bytes, else comma CSV. A CSV
    /// delimiter not pinned by the format id is sniffed from the first line.
    pub fn detect(&self, hint: &FormatHint, sample: &[u8]) -> Result<FormatSpec> {
        let mut spec = resolve_container(hint, sample);
        if spec.container == Container::Csv && spec.delimiter.is_none() {
            let name = hint.file_name.as_deref().unwrap_or("<upload>");
            let decoded = decode_text(name, sample, spec.encoding, &self.fallback)?;
            spec.delimiter = Some(sniff_delimiter(&decoded.text));
            spec.encoding = decoded.encoding;
        }
        tracing::debug!(
            container = %spec.container,
            delimiter = ?spec.delimiter.map(char::from),
            encoding = spec.encoding.label(),
            "detected format"
        );
        Ok(spec)
    }

    pub fn detect_file(&self, file: &SourceFile, format_id: Option<FileFormatId>) -> Result<FormatSpec> {
        self.detect(&FormatHint::for_file(file).with_format_id(format_id), &file.bytes)
    }
}

fn resolve_container(hint: &FormatHint, sample: &[u8]) -> FormatSpec {
    if let Some(format_id) = hint.format_id {
        return format_id.spec();
    }
    let by_mime = hint.content_type.as_deref().and_then(|content_type| {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        lookup(MIME_TABLE, &mime)
    });
    let by_extension = || {
        hint.file_name.as_deref().and_then(|name| {
            let extension = std::path::Path::new(name)
                .extension()?
                .to_string_lossy()
                .to_ascii_lowercase();
            lookup(EXTENSION_TABLE, &extension)
        })
    };
    by_mime
        .or_else(by_extension)
        .or_else(|| sniff_container(sample).map(FormatSpec::new))
        .unwrap_or(FormatSpec {
            delimiter: None,
            ..FormatSpec::default()
        })
}

fn lookup(table: &[(&str, Container, Option<u8>)], key: &str) -> Option<FormatSpec> {
    table
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|&(_, container, delimiter)| FormatSpec {
            container,
            delimiter,
            encoding: TextEncoding::Utf8,
        })
}

/// Container implied by the leading bytes, if they are distinctive.
fn sniff_container(sample: &[u8]) -> Option<Container> {
    const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
    if sample.starts_with(b"%PDF") {
        return Some(Container::Pdf);
    }
    if sample.starts_with(b"PK\x03\x04") || sample.starts_with(XLS_MAGIC) {
        return Some(Container::Excel);
    }
    let body = sample.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(sample);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'[' | b'{') => Some(Container::Json),
        Some(b'<') => Some(Container::Xml),
        _ => None,
    }
}

/// Most frequent candidate delimiter on the first line, comma if none.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    let mut best = (b',', 0usize);
    for candidate in DELIMITER_CANDIDATES {
        let count = first_line.bytes().filter(|b| *b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
