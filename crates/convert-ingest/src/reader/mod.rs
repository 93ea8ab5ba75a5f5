//! Row readers for every supported container.
//!
//! Readers hand out a lazy, finite [`Rows`] iterator of rows already
//! shaped to the target layout: headers missing from the file read as empty
//! strings and extra source columns are dropped.

mod csv;
mod excel;
mod json;
mod pdf;
mod xml;

use std::collections::HashMap;

use convert_model::{HeaderDescriptor, RawRow, StageLayout};

use crate::error::Result;
use crate::format::{Container, EncodingFallback, FormatSpec, TextEncoding};
use crate::source::SourceFile;

/// Shape of the rows a reader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Rows keyed by header name.
    #[default]
    Named,
    /// Rows addressed by header descriptor index.
    Positional,
}

/// Lazy sequence of rows from one file; not restartable.
pub struct Rows {
    inner: Box<dyn Iterator<Item = RawRow> + Send>,
    encoding: Option<TextEncoding>,
}

impl Rows {
    fn new<I>(rows: I, encoding: Option<TextEncoding>) -> Self
    where
        I: Iterator<Item = RawRow> + Send + 'static,
    {
        Self {
            inner: Box::new(rows),
            encoding,
        }
    }

    /// Encoding the text was decoded with, for text containers.
    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }
}

impl Iterator for Rows {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        self.inner.next()
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Shapes source values onto the target layout.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    layout: StageLayout,
    mode: ReadMode,
}

impl Projection {
    pub(crate) fn new(layout: &StageLayout, mode: ReadMode) -> Self {
        Self {
            layout: layout.clone(),
            mode,
        }
    }

    pub(crate) fn row<F>(&self, mut value_for: F) -> RawRow
    where
        F: FnMut(&HeaderDescriptor) -> Option<String>,
    {
        match self.mode {
            ReadMode::Named => RawRow::Named(
                self.layout
                    .headers()
                    .iter()
                    .map(|header| (header.name.clone(), value_for(header).unwrap_or_default()))
                    .collect(),
            ),
            ReadMode::Positional => {
                let mut row = self.layout.empty_row();
                for header in self.layout.headers() {
                    if let Some(value) = value_for(header) {
                        row[header.index] = value;
                    }
                }
                RawRow::Positional(row)
            }
        }
    }

    /// Row from an ordered list of named values; the first entry for a
    /// name wins.
    pub(crate) fn keyed_row(&self, record: &[(String, String)]) -> RawRow {
        self.row(|header| {
            let name = header.name.trim();
            record
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
    }
}

/// Positions of source columns by normalized header name; first wins.
pub(crate) fn column_positions<'a, I>(headers: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions = HashMap::new();
    for (position, header) in headers.into_iter().enumerate() {
        positions
            .entry(normalize_header(header))
            .or_insert(position);
    }
    positions
}

/// Trims whitespace and any byte order mark from a header cell.
pub fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

/// Reads files into rows shaped to a target layout.
#[derive(Debug, Clone, Default)]
pub struct RowReader {
    fallback: EncodingFallback,
}

impl RowReader {
    pub fn new(fallback: EncodingFallback) -> Self {
        Self { fallback }
    }

    pub fn read(
        &self,
        file: &SourceFile,
        spec: &FormatSpec,
        target: &StageLayout,
        mode: ReadMode,
    ) -> Result<Rows> {
        let projection = Projection::new(target, mode);
        let rows = match spec.container {
            Container::Csv => csv::read(file, spec, &self.fallback, projection)?,
            Container::Json => json::read(file, spec, &self.fallback, &projection)?,
            Container::Xml => xml::read(file, spec, &self.fallback, projection)?,
            Container::Excel => excel::read(file, &projection)?,
            Container::Pdf => pdf::read(file, &projection)?,
        };
        tracing::debug!(
            file = %file.name,
            container = %spec.container,
            encoding = ?rows.encoding().map(TextEncoding::label),
            "opened file for reading"
        );
        Ok(rows)
    }

    /// Header names found in `file`, in file order.
    pub fn headers(&self, file: &SourceFile, spec: &FormatSpec) -> Result<Vec<String>> {
        match spec.container {
            Container::Csv => csv::headers(file, spec, &self.fallback),
            Container::Json => json::headers(file, spec, &self.fallback),
            Container::Xml => xml::headers(file, spec, &self.fallback),
            Container::Excel => excel::headers(file),
            Container::Pdf => pdf::headers(file),
        }
    }
}
