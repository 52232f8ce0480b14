//! Field policy helpers shared by the mappers.
//!
//! Source records name coded values by prefix: `<prefix>_system`,
//! `<prefix>_code`, `<prefix>_name` and `<prefix>_concept_map`. Required
//! coding members default to `"N/A"`; everything else is set only when the
//! source value is present.

use fhir_model::{
    CodeableConcept, Coding, DomainRecord, Identifier, Meta, NOT_AVAILABLE, Quantity,
};

const SOURCE_SYSTEM: &str = "trg_source_system_name";
const SOURCE_ROW_ID: &str = "trg_row_ice_id";

/// Quantity comparators FHIR accepts.
const COMPARATORS: &[&str] = &["<", "<=", ">=", ">"];

fn field(prefix: &str, suffix: &str) -> String {
    format!("{prefix}_{suffix}")
}

/// Coding from `<prefix>_system`/`_code`/`_name`; system and code default to `"N/A"`.
pub fn coding(record: &DomainRecord, prefix: &str) -> Coding {
    Coding::new(
        record.text_or_na(&field(prefix, "system")),
        record.text_or_na(&field(prefix, "code")),
    )
    .with_display(record.text(&field(prefix, "name")))
}

/// Like [`coding`], with the display also defaulting to `"N/A"`.
pub fn coding_or_na(record: &DomainRecord, prefix: &str) -> Coding {
    Coding::new(
        record.text_or_na(&field(prefix, "system")),
        record.text_or_na(&field(prefix, "code")),
    )
    .with_display(Some(record.text_or_na(&field(prefix, "name"))))
}

/// Concept with a single coding and no text.
pub fn concept(record: &DomainRecord, prefix: &str) -> CodeableConcept {
    CodeableConcept::from_coding(coding(record, prefix))
}

/// Concept with a single coding and the source name as text.
pub fn named_concept(record: &DomainRecord, prefix: &str) -> CodeableConcept {
    CodeableConcept::from_coding(coding(record, prefix)).with_text(name(record, prefix))
}

/// Concept whose display and text both default to `"N/A"`.
pub fn concept_or_na(record: &DomainRecord, prefix: &str) -> CodeableConcept {
    CodeableConcept::from_coding(coding_or_na(record, prefix))
        .with_text(Some(record.text_or_na(&field(prefix, "name"))))
}

pub fn name(record: &DomainRecord, prefix: &str) -> Option<String> {
    record.text(&field(prefix, "name"))
}

pub fn code(record: &DomainRecord, prefix: &str) -> Option<String> {
    record.text(&field(prefix, "code"))
}

/// True when any of the coded members for a prefix is present.
pub fn has_coded(record: &DomainRecord, prefix: &str) -> bool {
    ["system", "code", "name"]
        .iter()
        .any(|suffix| record.has(&field(prefix, suffix)))
}

/// Provenance tags, one per concept-map field, always present.
pub fn concept_map_tags(record: &DomainRecord, prefixes: &[&str]) -> Meta {
    Meta {
        tag: prefixes
            .iter()
            .map(|prefix| {
                let system = field(prefix, "concept_map");
                let code = record.text_or_na(&system);
                Coding::new(system, code)
            })
            .collect(),
    }
}

/// Source row identifier, when the record carries one.
pub fn source_identifier(record: &DomainRecord) -> Vec<Identifier> {
    record
        .text(SOURCE_ROW_ID)
        .map(|value| Identifier::new(record.text(SOURCE_SYSTEM), value))
        .into_iter()
        .collect()
}

/// Comparator limited to `<`, `<=`, `>=`, `>`.
pub fn comparator(record: &DomainRecord, key: &str) -> Option<String> {
    record
        .text(key)
        .filter(|value| COMPARATORS.contains(&value.as_str()))
}

/// Quantity with a parsed value and unit members from `<unit_prefix>_*`.
///
/// Returns `None` when the value is absent or not numeric.
pub fn quantity(record: &DomainRecord, value_key: &str, unit_prefix: &str) -> Option<Quantity> {
    let value = record.number(value_key)?;
    Some(Quantity {
        value: Some(value),
        comparator: None,
        unit: record.text(&field(unit_prefix, "name")),
        system: Some(record.text_or_na(&field(unit_prefix, "system"))),
        code: Some(record.text_or_na(&field(unit_prefix, "code"))),
    })
}

/// Lower-cased value when it is in `allowed`, otherwise `default`.
pub fn enumerated(value: Option<String>, allowed: &[&str], default: &str) -> String {
    value
        .map(|v| v.to_ascii_lowercase())
        .filter(|v| allowed.contains(&v.as_str()))
        .unwrap_or_else(|| default.to_string())
}

/// The `"N/A"` placeholder as an owned string.
pub fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}
