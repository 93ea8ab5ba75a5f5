//! Delimited text reading.

use std::io::Cursor;

use ::csv::{ReaderBuilder, StringRecordsIntoIter};

use crate::decode::decode_text;
use crate::error::{IngestError, Result};
use crate::format::{EncodingFallback, FormatSpec, TextEncoding};
use crate::source::SourceFile;

use super::{Projection, Rows, column_positions, normalize_header};

fn records(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<(StringRecordsIntoIter<Cursor<Vec<u8>>>, TextEncoding)> {
    let decoded = decode_text(&file.name, &file.bytes, spec.encoding, fallback)?;
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(spec.delimiter_or_default())
        .from_reader(Cursor::new(decoded.text.into_bytes()));
    Ok((reader.into_records(), decoded.encoding))
}

fn header_row(
    file: &SourceFile,
    records: &mut StringRecordsIntoIter<Cursor<Vec<u8>>>,
) -> Result<Vec<String>> {
    match records.next() {
        Some(Ok(record)) => Ok(record.iter().map(normalize_header).collect()),
        Some(Err(error)) => Err(IngestError::Csv {
            file: file.name.clone(),
            message: error.to_string(),
        }),
        None => Err(IngestError::EmptyFile {
            file: file.name.clone(),
        }),
    }
}

/// First row is the header; data rows are matched to it by position.
pub(super) fn read(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
    projection: Projection,
) -> Result<Rows> {
    let (mut records, encoding) = records(file, spec, fallback)?;
    let header = header_row(file, &mut records)?;
    let positions = column_positions(header.iter().map(String::as_str));
    let name = file.name.clone();

    let rows = records.filter_map(move |record| match record {
        Ok(record) => Some(projection.row(|target| {
            positions
                .get(target.name.trim())
                .and_then(|&position| record.get(position))
                .map(str::to_string)
        })),
        Err(error) => {
            tracing::warn!(
                file = %name,
                line = ?error.position().map(|position| position.line()),
                %error,
                "skipping malformed CSV row"
            );
            None
        }
    });
    Ok(Rows::new(rows, Some(encoding)))
}

pub(super) fn headers(
    file: &SourceFile,
    spec: &FormatSpec,
    fallback: &EncodingFallback,
) -> Result<Vec<String>> {
    let (mut records, _) = records(file, spec, fallback)?;
    header_row(file, &mut records)
}
