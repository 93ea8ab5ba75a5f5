//! Workbook output with auto-sized columns.

use rust_xlsxwriter::Workbook;

use crate::error::Result;

/// Columns never get wider than this many characters.
pub const MAX_COLUMN_WIDTH: usize = 50;

/// Width of a column: longest value in characters plus two, capped.
pub fn column_width<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let longest = values
        .into_iter()
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0);
    (longest + 2).min(MAX_COLUMN_WIDTH)
}

/// Writes one sheet named `sheet_name`: the header row, then every row.
pub fn write_excel(rows: &[Vec<String>], headers: &[String], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, header)?;
        for (row_index, row) in rows.iter().enumerate() {
            if let Some(value) = row.get(col as usize).filter(|value| !value.is_empty()) {
                sheet.write_string(row_index as u32 + 1, col, value)?;
            }
        }
        let width = column_width(
            std::iter::once(header.as_str())
                .chain(rows.iter().filter_map(|row| row.get(col as usize)).map(String::as_str)),
        );
        sheet.set_column_width(col, width as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}
