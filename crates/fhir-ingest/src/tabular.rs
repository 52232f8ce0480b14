//! Grouping of flat tab-separated source tables into per-patient extracts.
//!
//! Every table in a folder contributes its rows, keyed by the table's file
//! stem, to the extract of the patient named in the row's `mrn` column.
//! The `notes` table is collapsed into one record per note type.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use fhir_model::{NOT_AVAILABLE, NoteRecord, parse_timestamp};
use fhir_output::{WrittenFile, write_json_file};

use crate::discovery::{file_safe_name, input_base_name, list_tabular_files};
use crate::error::{IngestError, Result};

const MRN: &str = "mrn";
const NOTES: &str = "notes";
const NOTE_TYPE: &str = "note_type";
const NOTE_LINE: &str = "note_line";
const NOTE_TEXT: &str = "note_text";
const NOTE_TIME: &str = "note_dttm";

/// Rows of one source table; header names are lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularFile {
    pub name: String,
    pub rows: Vec<Map<String, Value>>,
}

/// Result of grouping a folder.
#[derive(Debug, Clone, Default)]
pub struct GroupingReport {
    pub tables: usize,
    pub rows_without_mrn: usize,
    pub written: Vec<WrittenFile>,
}

/// Reads one tab-separated table. Short rows keep only the columns they
/// have; every value is kept as text.
pub fn read_tabular_file(path: &Path) -> Result<TabularFile> {
    let tabular_error = |source| IngestError::Tabular {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .map_err(tabular_error)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(tabular_error)?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(tabular_error)?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }
    debug!(path = %path.display(), rows = rows.len(), "read source table");

    Ok(TabularFile {
        name: input_base_name(path),
        rows,
    })
}

/// Groups rows from every table by MRN into `{mrn, <table>: [rows]}`
/// documents. Returns the documents keyed by MRN and the number of rows
/// skipped for lacking one.
pub fn group_by_mrn(tables: &[TabularFile]) -> (BTreeMap<String, Map<String, Value>>, usize) {
    let mut patients: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
    let mut skipped = 0;

    for table in tables {
        for row in &table.rows {
            let Some(mrn) = row_text(row, MRN) else {
                skipped += 1;
                continue;
            };
            let document = patients.entry(mrn.clone()).or_insert_with(|| {
                let mut document = Map::new();
                document.insert(MRN.to_string(), Value::String(mrn));
                document
            });
            let collection = document
                .entry(table.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(rows) = collection {
                rows.push(Value::Object(row.clone()));
            }
        }
    }

    (patients, skipped)
}

/// Collapses note lines into one [`NoteRecord`] per note type.
///
/// Types keep their first-appearance order. Lines are ordered by numeric
/// `note_line` (non-numeric counts as 0) and joined with newlines; the
/// record's time is the latest parseable `note_dttm`.
pub fn aggregate_notes(rows: &[Map<String, Value>]) -> Vec<NoteRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut by_type: HashMap<String, Vec<&Map<String, Value>>> = HashMap::new();
    for row in rows {
        let note_type = row_text(row, NOTE_TYPE).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        by_type
            .entry(note_type.clone())
            .or_insert_with(|| {
                order.push(note_type);
                Vec::new()
            })
            .push(row);
    }

    order
        .into_iter()
        .filter_map(|note_type| {
            let mut lines = by_type.remove(&note_type)?;
            lines.sort_by_key(|row| {
                row_text(row, NOTE_LINE)
                    .and_then(|line| line.parse::<i64>().ok())
                    .unwrap_or(0)
            });

            let latest = lines
                .iter()
                .filter_map(|row| {
                    let raw = row_text(row, NOTE_TIME)?;
                    parse_timestamp(&raw).map(|instant| (instant, raw))
                })
                .max_by_key(|(instant, _)| *instant)
                .map(|(_, raw)| raw)
                .or_else(|| lines.first().and_then(|row| row_text(row, NOTE_TIME)));

            let notes = lines
                .iter()
                .map(|row| row.get(NOTE_TEXT).and_then(Value::as_str).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n");

            Some(NoteRecord {
                mrn: lines.first().and_then(|row| row_text(row, MRN)),
                name: note_type,
                date_time: latest,
                notes,
            })
        })
        .collect()
}

/// Reads every table in `folder`, groups by MRN and writes
/// `<output_dir>/<mrn>.json` per patient.
pub fn group_folder(folder: &Path, output_dir: &Path) -> Result<GroupingReport> {
    let paths = list_tabular_files(folder)?;
    let tables = paths
        .iter()
        .map(|path| read_tabular_file(path))
        .collect::<Result<Vec<_>>>()?;
    let (patients, rows_without_mrn) = group_by_mrn(&tables);
    if rows_without_mrn > 0 {
        warn!(rows = rows_without_mrn, "rows without an MRN were skipped");
    }

    std::fs::create_dir_all(output_dir).map_err(|e| IngestError::CreateDir {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut report = GroupingReport {
        tables: tables.len(),
        rows_without_mrn,
        written: Vec::with_capacity(patients.len()),
    };
    for (mrn, mut document) in patients {
        let notes = match document.get(NOTES) {
            Some(Value::Array(items)) => {
                let rows: Vec<Map<String, Value>> =
                    items.iter().filter_map(Value::as_object).cloned().collect();
                aggregate_notes(&rows)
            }
            _ => Vec::new(),
        };
        document.insert(
            NOTES.to_string(),
            serde_json::to_value(&notes).unwrap_or_else(|_| Value::Array(Vec::new())),
        );

        let path: PathBuf = output_dir.join(format!("{}.json", file_safe_name(&mrn)));
        report.written.push(write_json_file(&path, &document)?);
    }

    info!(
        tables = report.tables,
        patients = report.written.len(),
        "grouped source tables by MRN"
    );
    Ok(report)
}

fn row_text(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
