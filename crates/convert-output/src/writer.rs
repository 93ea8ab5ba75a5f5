//! Dispatch from a format to the matching writer.

use convert_ingest::{Container, FileFormatId, FormatSpec};

use crate::csv::write_csv;
use crate::error::{OutputError, Result};
use crate::excel::write_excel;
use crate::json::write_json;
use crate::substitute::SubstitutionTable;
use crate::xml::write_xml;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// A written output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub file_name: String,
    pub format: FileFormatId,
    pub bytes: Vec<u8>,
}

/// Serializes ordered rows into output buffers.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    sheet_name: String,
    substitutions: SubstitutionTable,
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_NAME, SubstitutionTable::default())
    }
}

impl OutputWriter {
    pub fn new(sheet_name: impl Into<String>, substitutions: SubstitutionTable) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            substitutions,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Writes `rows` under `headers`; every row must be as wide as the
    /// header list.
    pub fn write(&self, rows: &[Vec<String>], headers: &[String], spec: &FormatSpec) -> Result<Vec<u8>> {
        check_widths(rows, headers)?;
        let bytes = match spec.container {
            Container::Csv => write_csv(
                rows,
                headers,
                spec.delimiter_or_default(),
                spec.encoding,
                &self.substitutions,
            )?,
            Container::Excel => write_excel(rows, headers, &self.sheet_name)?,
            Container::Json => write_json(rows, headers)?,
            Container::Xml => write_xml(rows, headers)?,
            Container::Pdf => {
                return Err(OutputError::UnsupportedFormat {
                    format: spec.container.to_string(),
                });
            }
        };
        tracing::debug!(
            container = %spec.container,
            rows = rows.len(),
            bytes = bytes.len(),
            "wrote output"
        );
        Ok(bytes)
    }

    /// Writes one output file named `{stem}.{extension}`.
    pub fn write_artifact(
        &self,
        rows: &[Vec<String>],
        headers: &[String],
        format: FileFormatId,
        stem: &str,
    ) -> Result<OutputArtifact> {
        let bytes = self.write(rows, headers, &format.spec())?;
        Ok(OutputArtifact {
            file_name: format!("{stem}.{}", format.extension()),
            format,
            bytes,
        })
    }
}

fn check_widths(rows: &[Vec<String>], headers: &[String]) -> Result<()> {
    match rows.iter().position(|row| row.len() != headers.len()) {
        Some(row) => Err(OutputError::RowWidth {
            row,
            expected: headers.len(),
            actual: rows[row].len(),
        }),
        None => Ok(()),
    }
}
