//! Containers, encodings and the format id table.

use std::fmt;
use std::str::FromStr;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Csv,
    Excel,
    Json,
    Xml,
    Pdf,
}

impl Container {
    pub fn is_text(self) -> bool {
        matches!(self, Container::Csv | Container::Json | Container::Xml)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Container::Csv => "CSV",
            Container::Excel => "Excel",
            Container::Json => "JSON",
            Container::Xml => "XML",
            Container::Pdf => "PDF",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Text encodings accepted for input and output.
///
/// `ShiftJis` and `Cp932` share the Windows-31J codec, which is a superset
/// of Shift_JIS. `Iso8859_1` uses windows-1252, which decodes any byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    Utf8,
    ShiftJis,
    Cp932,
    Iso8859_1,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::ShiftJis => "shift_jis",
            TextEncoding::Cp932 => "cp932",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }

    pub fn codec(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::ShiftJis | TextEncoding::Cp932 => encoding_rs::SHIFT_JIS,
            TextEncoding::Iso8859_1 => encoding_rs::WINDOWS_1252,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "shift-jis" | "sjis" | "shiftjis" => Ok(TextEncoding::ShiftJis),
            "cp932" | "windows-31j" | "ms932" => Ok(TextEncoding::Cp932),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(TextEncoding::Iso8859_1),
            _ => Err(IngestError::UnknownEncoding {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(encoding: TextEncoding) -> Self {
        encoding.label().to_string()
    }
}

/// Ordered encodings tried when decoding text input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodingFallback(Vec<TextEncoding>);

impl Default for EncodingFallback {
    fn default() -> Self {
        Self(vec![
            TextEncoding::Utf8,
            TextEncoding::ShiftJis,
            TextEncoding::Cp932,
            TextEncoding::Iso8859_1,
        ])
    }
}

impl EncodingFallback {
    pub fn new(order: Vec<TextEncoding>) -> Self {
        Self(order)
    }

    pub fn order(&self) -> &[TextEncoding] {
        &self.0
    }

    /// `primary` first, then the configured order, without repeats.
    pub fn candidates(&self, primary: TextEncoding) -> Vec<TextEncoding> {
        let mut candidates = vec![primary];
        for encoding in &self.0 {
            if !candidates.contains(encoding) {
                candidates.push(*encoding);
            }
        }
        candidates
    }
}

/// Named format ids used by upload and download settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormatId {
    #[serde(rename = "CSV_C_SJIS")]
    CsvCommaSjis,
    #[serde(rename = "CSV_C_UTF-8", alias = "CSV_C_UTF8")]
    CsvCommaUtf8,
    #[serde(rename = "CSV_T_SJIS")]
    CsvTabSjis,
    #[serde(rename = "CSV_T_UTF-8", alias = "CSV_T_UTF8")]
    CsvTabUtf8,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "XML")]
    Xml,
    #[serde(rename = "EXCEL", alias = "XLSX")]
    Excel,
    #[serde(rename = "PDF")]
    Pdf,
}

impl FileFormatId {
    pub const ALL: [FileFormatId; 8] = [
        FileFormatId::CsvCommaSjis,
        FileFormatId::CsvCommaUtf8,
        FileFormatId::CsvTabSjis,
        FileFormatId::CsvTabUtf8,
        FileFormatId::Json,
        FileFormatId::Xml,
        FileFormatId::Excel,
        FileFormatId::Pdf,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FileFormatId::CsvCommaSjis => "CSV_C_SJIS",
            FileFormatId::CsvCommaUtf8 => "CSV_C_UTF-8",
            FileFormatId::CsvTabSjis => "CSV_T_SJIS",
            FileFormatId::CsvTabUtf8 => "CSV_T_UTF-8",
            FileFormatId::Json => "JSON",
            FileFormatId::Xml => "XML",
            FileFormatId::Excel => "EXCEL",
            FileFormatId::Pdf => "PDF",
        }
    }

    /// The fully pinned format this id stands for.
    pub fn spec(self) -> FormatSpec {
        match self {
            FileFormatId::CsvCommaSjis => FormatSpec::csv(b',', TextEncoding::ShiftJis),
            FileFormatId::CsvCommaUtf8 => FormatSpec::csv(b',', TextEncoding::Utf8),
            FileFormatId::CsvTabSjis => FormatSpec::csv(b'\t', TextEncoding::ShiftJis),
            FileFormatId::CsvTabUtf8 => FormatSpec::csv(b'\t', TextEncoding::Utf8),
            FileFormatId::Json => FormatSpec::new(Container::Json),
            FileFormatId::Xml => FormatSpec::new(Container::Xml),
            FileFormatId::Excel => FormatSpec::new(Container::Excel),
            FileFormatId::Pdf => FormatSpec::new(Container::Pdf),
        }
    }

    /// Default file extension for output named by this id.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormatId::CsvCommaSjis | FileFormatId::CsvCommaUtf8 => "csv",
            FileFormatId::CsvTabSjis | FileFormatId::CsvTabUtf8 => "tsv",
            FileFormatId::Json => "json",
            FileFormatId::Xml => "xml",
            FileFormatId::Excel => "xlsx",
            FileFormatId::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileFormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FileFormatId {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace("UTF8", "UTF-8");
        if normalized == "XLSX" {
            return Ok(FileFormatId::Excel);
        }
        Self::ALL
            .into_iter()
            .find(|format| format.id() == normalized)
            .ok_or_else(|| IngestError::UnknownFormatId { id: s.to_string() })
    }
}

/// Resolved description of how to read (or write) one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub container: Container,
    /// Field delimiter for CSV; `None` until pinned or sniffed.
    pub delimiter: Option<u8>,
    /// Primary encoding for text containers.
    pub encoding: TextEncoding,
}

impl FormatSpec {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            delimiter: None,
            encoding: TextEncoding::Utf8,
        }
    }

    pub fn csv(delimiter: u8, encoding: TextEncoding) -> Self {
        Self {
            container: Container::Csv,
            delimiter: Some(delimiter),
            encoding,
        }
    }

    /// Delimiter to use, comma when nothing was pinned or sniffed.
    pub fn delimiter_or_default(&self) -> u8 {
        self.delimiter.unwrap_or(b',')
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self::csv(b',', TextEncoding::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ids_pin_delimiter_and_encoding() {
        let spec = "CSV_T_SJIS".parse::<FileFormatId>().unwrap().spec();
        assert_eq!(spec.container, Container::Csv);
        assert_eq!(spec.delimiter, Some(b'\t'));
        assert_eq!(spec.encoding, TextEncoding::ShiftJis);
        assert_eq!(
            "csv_c_utf8".parse::<FileFormatId>().unwrap(),
            FileFormatId::CsvCommaUtf8
        );
        assert!("CSV_X".parse::<FileFormatId>().is_err());
    }

    #[test]
    fn candidates_put_primary_first_without_repeats() {
        let fallback = EncodingFallback::default();
        assert_eq!(
            fallback.candidates(TextEncoding::ShiftJis),
            vec![
                TextEncoding::ShiftJis,
                TextEncoding::Utf8,
                TextEncoding::Cp932,
                TextEncoding::Iso8859_1,
            ]
        );
    }

    #[test]
    fn encodings_parse_common_labels() {
        assert_eq!("SJIS".parse::<TextEncoding>().unwrap(), TextEncoding::ShiftJis);
        assert_eq!("Windows-31J".parse::<TextEncoding>().unwrap(), TextEncoding::Cp932);
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Iso8859_1);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }
}
