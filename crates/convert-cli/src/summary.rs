//! Terminal tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use convert_rules::CatalogEntry;

use crate::commands::{Inspection, RunOutcome};

pub fn run_table(outcome: &RunOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Status"),
        header_cell("Batches"),
        header_cell("Skipped"),
        header_cell("Rows"),
        header_cell("Message"),
    ]);
    apply_summary_table_style(&mut table);
    for column in 2..=4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for report in &outcome.report.stages {
        let status = &report.status;
        table.add_row(vec![
            Cell::new(report.stage.display_name())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(status.is_success()),
            Cell::new(status.batches_written),
            count_cell(status.batches_skipped, Color::Yellow),
            Cell::new(status.rows),
            Cell::new(&status.message),
        ]);
    }
    table
}

pub fn output_table(outcome: &RunOutcome) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Format"),
        header_cell("Bytes"),
        header_cell("SHA-256"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for file in &outcome.written {
        table.add_row(vec![
            Cell::new(file.path.display()),
            file.format.map_or_else(|| dim_cell("ZIP"), |format| Cell::new(format.id())),
            Cell::new(file.bytes),
            dim_cell(&file.sha256),
        ]);
    }
    table
}

pub fn print_run_summary(outcome: &RunOutcome) {
    println!("Session: {}", outcome.report.session_id);
    println!("{}", run_table(outcome));
    println!("{}", output_table(outcome));
    println!("Finished in {} ms", outcome.report.duration_ms);
}

pub fn inspection_table(inspection: &Inspection) -> Table {
    let mut table = Table::new();
    table.set_header(inspection.headers.iter().map(|header| header_cell(header)));
    apply_table_style(&mut table);
    for row in &inspection.rows {
        table.add_row(row.iter().map(|value| {
            if value.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(value)
            }
        }));
    }
    table
}

pub fn print_inspection(inspection: &Inspection) {
    println!("File: {}", inspection.file);
    println!("Container: {}", inspection.spec.container);
    if let Some(delimiter) = inspection.spec.delimiter {
        println!("Delimiter: {:?}", char::from(delimiter));
    }
    if let Some(encoding) = inspection.encoding {
        println!("Encoding: {}", encoding.label());
    }
    println!("Headers: {}", inspection.headers.len());
    println!("{}", inspection_table(inspection));
}

pub fn rules_table(entries: &[CatalogEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Aliases"),
        header_cell("Kind"),
        header_cell("Description"),
    ]);
    apply_table_style(&mut table);
    for entry in entries {
        let aliases = if entry.aliases.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(entry.aliases.join(", "))
        };
        let kind = if entry.kind.is_fixed() {
            Cell::new("fixed").fg(Color::Magenta)
        } else {
            Cell::new("pure").fg(Color::Green)
        };
        table.add_row(vec![
            Cell::new(entry.id).add_attribute(Attribute::Bold),
            aliases,
            kind,
            Cell::new(entry.kind.description()),
        ]);
    }
    table
}

pub fn applied_table(rule_id: &str, pairs: &[(String, String)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Value"), header_cell(rule_id)]);
    apply_table_style(&mut table);
    for (before, after) in pairs {
        let after_cell = if before == after {
            dim_cell(after)
        } else {
            Cell::new(after).fg(Color::Green)
        };
        table.add_row(vec![Cell::new(before), after_cell]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(success: bool) -> Cell {
    if success {
        Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(Color::Red).add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
