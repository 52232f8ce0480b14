use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fhir_core::{FileResult, FileStatus};

use crate::types::{BundleRun, GroupRun};

pub fn print_summary(run: &BundleRun) {
    let summary = &run.summary;
    println!("Mode: {}", summary.mode);
    println!("Output: {}", run.output_dir.display());
    if let Some(path) = &run.report {
        println!("Run report: {}", path.display());
    }
    if summary.codes_loaded == 0 {
        println!("Code descriptions: none loaded");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Status"),
        header_cell("Entries"),
        header_cell("Attachments"),
        header_cell("Failed"),
        header_cell("Bytes"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);

    let mut total_entries = 0usize;
    let mut total_attached = 0usize;
    let mut total_failed_attachments = 0usize;
    let mut total_bytes = 0u64;
    for result in &summary.files {
        let failed_attachments = result.attachments.failed.len();
        total_attached += result.attachments.attached;
        total_failed_attachments += failed_attachments;
        let (entries, bytes) = match &result.status {
            FileStatus::Written { entries, bytes, .. } => {
                total_entries += entries;
                total_bytes += bytes;
                (Cell::new(entries), Cell::new(bytes))
            }
            FileStatus::Failed { .. } => (dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            Cell::new(&result.file),
            status_cell(result),
            entries,
            Cell::new(result.attachments.attached),
            count_cell(failed_attachments, Color::Yellow),
            bytes,
        ]);
    }
    let failed_files = summary.failed().count();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} ok / {failed_files} failed",
            summary.succeeded().count()
        ))
        .add_attribute(Attribute::Bold),
        Cell::new(total_entries).add_attribute(Attribute::Bold),
        Cell::new(total_attached).add_attribute(Attribute::Bold),
        count_cell(total_failed_attachments, Color::Yellow).add_attribute(Attribute::Bold),
        Cell::new(total_bytes).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Finished in {} ms", summary.duration_ms);

    if failed_files > 0 {
        eprintln!("Failed files:");
        for result in summary.failed() {
            if let FileStatus::Failed { error } = &result.status {
                eprintln!("- {}: {error}", result.file);
            }
        }
    }
    if total_failed_attachments > 0 {
        eprintln!("Failed attachments:");
        for (file, failed) in summary.failed_attachments() {
            eprintln!("- {file}/{}: {}", failed.file, failed.reason);
        }
    }
}

pub fn print_group_summary(run: &GroupRun) {
    println!("Folder: {}", run.folder.display());
    println!("Output: {}", run.output_dir.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Tables"),
        header_cell("Patients"),
        header_cell("Rows without MRN"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(run.report.tables),
        Cell::new(run.report.written.len()),
        count_cell(run.report.rows_without_mrn, Color::Yellow),
    ]);
    println!("{table}");
}

fn status_cell(result: &FileResult) -> Cell {
    if result.is_success() {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
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
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
