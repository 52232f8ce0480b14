//! Expansion of a consolidated demographics extract into per-patient files.
//!
//! The consolidated file is a JSON array of arrays of flat demographic
//! records. Each record carrying a `linkage_id` becomes
//! `<input_dir>/<linkage_id>.json` holding `{mrn, demographics: [record]}`,
//! which the bundler then reads like any other extract.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use fhir_model::redact_value;
use fhir_output::write_json_file;

use crate::discovery::file_safe_name;
use crate::error::{IngestError, Result};

const LINKAGE_ID: &str = "linkage_id";
const MRN: &str = "mrn";

/// Outcome of expanding a consolidated demographics file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsExpansion {
    /// Linkage identifier and the extract file written for it.
    pub written: Vec<(String, PathBuf)>,
    /// Records without a usable `linkage_id`.
    pub skipped: usize,
    /// Linkage identifiers seen more than once; the last record wins.
    pub duplicates: Vec<String>,
}

/// Reads `source` and writes one extract per patient into `input_dir`.
pub fn expand_demographics(source: &Path, input_dir: &Path) -> Result<DemographicsExpansion> {
    let bytes = std::fs::read(source).map_err(|e| IngestError::FileRead {
        path: source.to_path_buf(),
        source: e,
    })?;
    let document: Value = serde_json::from_slice(&bytes).map_err(|e| IngestError::Json {
        path: source.to_path_buf(),
        source: e,
    })?;
    let records = flatten_records(&document).ok_or_else(|| IngestError::DemographicsLayout {
        path: source.to_path_buf(),
        reason: "expected an array of demographic records or arrays of records".to_string(),
    })?;

    std::fs::create_dir_all(input_dir).map_err(|e| IngestError::CreateDir {
        path: input_dir.to_path_buf(),
        source: e,
    })?;

    let mut expansion = DemographicsExpansion::default();
    let mut seen = BTreeSet::new();
    for record in records {
        let Some(linkage_id) = record.get(LINKAGE_ID).and_then(text) else {
            expansion.skipped += 1;
            continue;
        };
        if !seen.insert(linkage_id.clone()) {
            warn!(
                linkage_id = redact_value(&linkage_id),
                "duplicate linkage id; later record replaces earlier"
            );
            expansion.duplicates.push(linkage_id.clone());
        }

        let mrn = record.get(MRN).and_then(text).unwrap_or_else(|| linkage_id.clone());
        let path = input_dir.join(format!("{}.json", file_safe_name(&linkage_id)));
        write_json_file(&path, &json!({ "mrn": mrn, "demographics": [record] }))?;
        debug!(path = %path.display(), "wrote patient extract");

        expansion.written.retain(|(id, _)| *id != linkage_id);
        expansion.written.push((linkage_id, path));
    }

    if expansion.skipped > 0 {
        warn!(
            skipped = expansion.skipped,
            "demographic records without a linkage id were skipped"
        );
    }
    info!(
        patients = expansion.written.len(),
        source = %source.display(),
        "expanded consolidated demographics"
    );
    Ok(expansion)
}

/// Collects record objects from an array of arrays, also accepting a flat
/// array. Non-object leaves are ignored.
fn flatten_records(document: &Value) -> Option<Vec<&Map<String, Value>>> {
    let Value::Array(outer) = document else {
        return None;
    };
    let mut records = Vec::new();
    for item in outer {
        match item {
            Value::Object(record) => records.push(record),
            Value::Array(inner) => records.extend(inner.iter().filter_map(Value::as_object)),
            _ => {}
        }
    }
    Some(records)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_and_flat_layouts() {
        let nested = json!([[{"linkage_id": "a"}, 3], [{"linkage_id": "b"}], {"linkage_id": "c"}]);
        let records = flatten_records(&nested).expect("array");
        assert_eq!(records.len(), 3);
        assert!(flatten_records(&json!({"linkage_id": "a"})).is_none());
    }

    #[test]
    fn numeric_ids_are_text() {
        assert_eq!(text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(text(&json!("  ")), None);
    }
}
