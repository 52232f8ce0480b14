//! The per-patient clinical extract read from one input file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datetime::{normalize_date, normalize_timestamp};
use crate::domain::ClinicalDomain;
use crate::error::{ExtractError, Result, json_kind};
use crate::NOT_AVAILABLE;

const GROUPED_KEY: &str = "clinical_domain";
const DEMOGRAPHICS_KEY: &str = "demographics";
const NOTES_KEY: &str = "notes";
const PATIENT_ID_KEY: &str = "patient_tempus_id";
const MRN_KEY: &str = "mrn";

/// One flat source record with field-policy accessors.
///
/// Text accessors trim and treat empty strings as absent. Numbers are
/// coerced from either JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRecord(Map<String, Value>);

impl DomainRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Trimmed, non-empty text. Numbers and booleans are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        value_text(self.0.get(key)?)
    }

    pub fn has(&self, key: &str) -> bool {
        self.text(key).is_some()
    }

    /// Text, or `"N/A"` when absent.
    pub fn text_or_na(&self, key: &str) -> String {
        self.text(key).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// A finite number; non-numeric text is treated as absent.
    pub fn number(&self, key: &str) -> Option<f64> {
        let value = match self.0.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// An integer; fractional input is truncated.
    pub fn integer(&self, key: &str) -> Option<i64> {
        if let Some(Value::Number(n)) = self.0.get(key)
            && let Some(i) = n.as_i64()
        {
            return Some(i);
        }
        if let Some(Value::String(s)) = self.0.get(key)
            && let Ok(i) = s.trim().parse::<i64>()
        {
            return Some(i);
        }
        self.number(key).map(|value| value.trunc() as i64)
    }

    /// Timestamp normalized to `YYYY-MM-DDTHH:MM:SS.sssZ`.
    pub fn timestamp(&self, key: &str) -> Option<String> {
        self.text(key).and_then(|value| normalize_timestamp(&value))
    }

    /// Calendar date normalized to `YYYY-MM-DD`.
    pub fn date(&self, key: &str) -> Option<String> {
        self.text(key).and_then(|value| normalize_date(&value))
    }

    /// Truthy flag: `true`, non-zero numbers, and `true`/`1`/`yes`/`y` text.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "y"
            ),
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for DomainRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A pre-aggregated clinical note: every line of one note type joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    pub notes: String,
}

impl NoteRecord {
    /// `None` for non-object entries and notes without a type name.
    fn from_value(value: &Value) -> Option<Self> {
        let record = DomainRecord::new(value.as_object()?.clone());
        Some(Self {
            mrn: record.text("mrn"),
            name: record.text("name")?,
            date_time: record.text("dateTime"),
            notes: record
                .get("notes")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collection_value<'a>(
    root: &'a Map<String, Value>,
    grouped: Option<&'a Map<String, Value>>,
    key: &str,
) -> Option<&'a Value> {
    grouped
        .and_then(|g| g.get(key))
        .filter(|v| !v.is_null())
        .or_else(|| root.get(key).filter(|v| !v.is_null()))
}

/// One input file: a single patient and their domain collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClinicalExtract {
    pub demographics: Option<DomainRecord>,
    pub collections: BTreeMap<ClinicalDomain, Vec<DomainRecord>>,
    pub notes: Vec<NoteRecord>,
    pub patient_id: Option<String>,
    pub mrn: Option<String>,
    /// Collection elements dropped because they were not objects, and notes
    /// without a type name.
    pub skipped_records: usize,
}

impl ClinicalExtract {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&value)
    }

    /// Reads the extract from a parsed document.
    ///
    /// A collection nested under `clinical_domain` takes precedence over a
    /// top-level collection of the same name. `null` collections are absent.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(ExtractError::NotAnObject {
                found: json_kind(value),
            });
        };
        let grouped = root.get(GROUPED_KEY).and_then(Value::as_object);
        let lookup = |key: &str| collection_value(root, grouped, key);

        let mut extract = Self {
            patient_id: root.get(PATIENT_ID_KEY).and_then(value_text),
            ..Self::default()
        };

        extract.demographics = match lookup(DEMOGRAPHICS_KEY) {
            None => None,
            Some(Value::Array(items)) => items.iter().find_map(|item| {
                item.as_object().map(|fields| DomainRecord::new(fields.clone()))
            }),
            Some(Value::Object(fields)) => Some(DomainRecord::new(fields.clone())),
            Some(other) => {
                return Err(ExtractError::InvalidCollection {
                    name: DEMOGRAPHICS_KEY.to_string(),
                    found: json_kind(other),
                });
            }
        };

        extract.mrn = root
            .get(MRN_KEY)
            .and_then(value_text)
            .or_else(|| extract.demographics.as_ref().and_then(|d| d.text(MRN_KEY)));

        for domain in ClinicalDomain::ALL {
            let Some(value) = lookup(domain.key()) else {
                continue;
            };
            let Value::Array(items) = value else {
                return Err(ExtractError::InvalidCollection {
                    name: domain.key().to_string(),
                    found: json_kind(value),
                });
            };
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(fields) => records.push(DomainRecord::new(fields.clone())),
                    _ => extract.skipped_records += 1,
                }
            }
            if !records.is_empty() {
                extract.collections.insert(domain, records);
            }
        }

        if let Some(value) = lookup(NOTES_KEY) {
            let Value::Array(items) = value else {
                return Err(ExtractError::InvalidCollection {
                    name: NOTES_KEY.to_string(),
                    found: json_kind(value),
                });
            };
            for item in items {
                match NoteRecord::from_value(item) {
                    Some(note) => extract.notes.push(note),
                    None => extract.skipped_records += 1,
                }
            }
        }

        Ok(extract)
    }

    /// Records for a domain, empty when the collection is absent.
    pub fn collection(&self, domain: ClinicalDomain) -> &[DomainRecord] {
        self.collections
            .get(&domain)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of domain records across all collections.
    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> DomainRecord {
        match value {
            Value::Object(fields) => DomainRecord::new(fields),
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn text_trims_and_elides_empty() {
        let r = record(json!({"a": "  x ", "b": "   ", "c": 12, "d": null}));
        assert_eq!(r.text("a").as_deref(), Some("x"));
        assert_eq!(r.text("b"), None);
        assert_eq!(r.text("c").as_deref(), Some("12"));
        assert_eq!(r.text("d"), None);
        assert_eq!(r.text_or_na("missing"), "N/A");
    }

    #[test]
    fn numbers_coerce_from_strings() {
        let r = record(json!({"a": "4.5", "b": "high", "c": 7, "d": "3.9", "e": "NaN"}));
        assert_eq!(r.number("a"), Some(4.5));
        assert_eq!(r.number("b"), None);
        assert_eq!(r.number("c"), Some(7.0));
        assert_eq!(r.integer("d"), Some(3));
        assert_eq!(r.integer("c"), Some(7));
        assert_eq!(r.number("e"), None);
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        let r = record(json!({"a": "Yes", "b": "0", "c": 1, "d": false, "e": "no"}));
        assert!(r.flag("a"));
        assert!(!r.flag("b"));
        assert!(r.flag("c"));
        assert!(!r.flag("d"));
        assert!(!r.flag("e"));
        assert!(!r.flag("missing"));
    }

    #[test]
    fn grouped_collection_wins_over_flat() {
        let extract = ClinicalExtract::from_value(&json!({
            "demographics": [{"first_name": "Jane"}],
            "labs": [{"lab_type_name": "flat"}],
            "clinical_domain": {
                "labs": [{"lab_type_name": "grouped"}],
            },
            "vitals": [{"vitals_type_name": "pulse"}],
        }))
        .expect("parse extract");
        let labs = extract.collection(ClinicalDomain::Labs);
        assert_eq!(labs.len(), 1);
        assert_eq!(labs[0].text("lab_type_name").as_deref(), Some("grouped"));
        assert_eq!(extract.collection(ClinicalDomain::Vitals).len(), 1);
        assert_eq!(extract.record_count(), 2);
    }

    #[test]
    fn first_demographics_entry_is_used() {
        let extract = ClinicalExtract::from_value(&json!({
            "patient_tempus_id": "abc",
            "demographics": [{"mrn": "1"}, {"mrn": "2"}],
        }))
        .expect("parse extract");
        let demographics = extract.demographics.expect("demographics");
        assert_eq!(demographics.text("mrn").as_deref(), Some("1"));
        assert_eq!(extract.mrn.as_deref(), Some("1"));
        assert_eq!(extract.patient_id.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_and_null_collections_are_absent() {
        let extract = ClinicalExtract::from_value(&json!({
            "demographics": [],
            "labs": [],
            "vitals": null,
        }))
        .expect("parse extract");
        assert!(extract.demographics.is_none());
        assert!(extract.collections.is_empty());
    }

    #[test]
    fn non_array_collection_is_an_error() {
        let err = ClinicalExtract::from_value(&json!({"labs": "nope"})).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidCollection { ref name, found: "string" } if name == "labs"
        ));
    }

    #[test]
    fn non_object_records_are_skipped() {
        let extract = ClinicalExtract::from_value(&json!({
            "labs": [1, {"lab_type_name": "a"}, "x"],
        }))
        .expect("parse extract");
        assert_eq!(extract.collection(ClinicalDomain::Labs).len(), 1);
        assert_eq!(extract.skipped_records, 2);
    }

    #[test]
    fn root_must_be_an_object() {
        let err = ClinicalExtract::from_slice(b"[1, 2]").unwrap_err();
        assert!(matches!(err, ExtractError::NotAnObject { found: "array" }));
        let err = ClinicalExtract::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }

    #[test]
    fn notes_are_read() {
        let extract = ClinicalExtract::from_value(&json!({
            "notes": [{"mrn": 42, "name": "Progress", "dateTime": "2024-01-01", "notes": "a\nb"}],
        }))
        .expect("parse extract");
        assert_eq!(extract.notes.len(), 1);
        assert_eq!(extract.notes[0].mrn.as_deref(), Some("42"));
        assert_eq!(extract.notes[0].notes, "a\nb");
    }

    #[test]
    fn untyped_note_is_skipped_and_siblings_kept() {
        let extract = ClinicalExtract::from_value(&json!({
            "demographics": [{"first_name": "A"}],
            "notes": [{"notes": "x"}, {"name": "Progress", "notes": "y"}, 7],
        }))
        .expect("parse extract");
        assert!(extract.demographics.is_some());
        assert_eq!(extract.notes.len(), 1);
        assert_eq!(extract.notes[0].name, "Progress");
        assert_eq!(extract.notes[0].notes, "y");
        assert_eq!(extract.skipped_records, 2);
    }
}
