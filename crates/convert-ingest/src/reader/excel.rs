//! Workbook reading through calamine: first sheet, first row is the header.

use std::io::Cursor;

use calamine::{Data, DataType, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;

use crate::error::{IngestError, Result};
use crate::source::SourceFile;

use super::{Projection, Rows, column_positions, normalize_header};

fn first_sheet(file: &SourceFile) -> Result<Range<Data>> {
    let excel_error = |message: String| IngestError::Excel {
        file: file.name.clone(),
        message,
    };
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.bytes.clone()))
        .map_err(|error| excel_error(error.to_string()))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyFile {
            file: file.name.clone(),
        })?
        .map_err(|error| excel_error(error.to_string()))
}

/// Text rendering of a cell; dates keep the slash form the rules expect.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(moment) if moment.time() == NaiveTime::MIN => {
                moment.format("%Y/%m/%d").to_string()
            }
            Some(moment) => moment.format("%Y/%m/%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}

fn header_row(file: &SourceFile, range: &Range<Data>) -> Result<Vec<String>> {
    range
        .rows()
        .next()
        .map(|cells| cells.iter().map(|cell| normalize_header(&cell_text(cell))).collect())
        .ok_or_else(|| IngestError::EmptyFile {
            file: file.name.clone(),
        })
}

pub(super) fn read(file: &SourceFile, projection: &Projection) -> Result<Rows> {
    let range = first_sheet(file)?;
    let header = header_row(file, &range)?;
    let positions = column_positions(header.iter().map(String::as_str));

    let rows: Vec<_> = range
        .rows()
        .skip(1)
        .filter(|cells| !cells.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|cells| {
            projection.row(|target| {
                positions
                    .get(target.name.trim())
                    .and_then(|&position| cells.get(position))
                    .map(cell_text)
            })
        })
        .collect();
    tracing::debug!(file = %file.name, rows = rows.len(), "read first worksheet");
    Ok(Rows::new(rows.into_iter(), None))
}

pub(super) fn headers(file: &SourceFile) -> Result<Vec<String>> {
    let range = first_sheet(file)?;
    header_row(file, &range)
}
