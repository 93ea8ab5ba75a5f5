//! Delimited text output.

use ::csv::{Terminator, WriterBuilder};
use convert_ingest::TextEncoding;

use crate::error::{OutputError, Result};
use crate::substitute::{SubstitutionTable, encode_lossy};

/// Writes the header row and then every row, in order, as delimited text
/// in `encoding`. Records end with `\r\n`.
pub fn write_csv(
    rows: &[Vec<String>],
    headers: &[String],
    delimiter: u8,
    encoding: TextEncoding,
    substitutions: &SubstitutionTable,
) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    let normalize = |value: &String| substitutions.normalize(value, encoding);
    writer
        .write_record(headers.iter().map(normalize))
        .map_err(|source| OutputError::Csv { source })?;
    for row in rows {
        writer
            .write_record(row.iter().map(normalize))
            .map_err(|source| OutputError::Csv { source })?;
    }

    let text = writer
        .into_inner()
        .map_err(|error| OutputError::Io {
            source: error.into_error(),
        })?;
    let text = String::from_utf8(text).map_err(|error| OutputError::Io {
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, error),
    })?;
    let (bytes, dropped) = encode_lossy(&text, encoding);
    if dropped > 0 {
        tracing::warn!(
            encoding = encoding.label(),
            dropped,
            "dropped characters the output encoding cannot represent"
        );
    }
    Ok(bytes)
}
