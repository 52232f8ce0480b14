//! Labs to an Observation plus the DiagnosticReport that cites it.

use fhir_model::{
    CodeableConcept, Coding, DiagnosticReport, DomainRecord, Observation, Resource,
};

use crate::context::MappingContext;
use crate::fields::{
    comparator, concept, concept_map_tags, coding_or_na, named_concept, quantity,
    source_identifier,
};
use crate::mapped::Mapped;

const LAB_CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0074";
const CONCEPT_MAPS: &[&str] = &["lab_type", "quantity_unit", "lab_value"];

/// The report's `result` is filled in by the assembler once the
/// observation's `fullUrl` is known.
pub fn map_lab(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let meta = Some(concept_map_tags(record, CONCEPT_MAPS));
    let effective = record.timestamp("effective_date_string");

    let value_quantity = quantity(record, "lab_value_quantity", "quantity_unit").map(|mut q| {
        q.comparator = comparator(record, "quantity_comparator");
        q
    });
    let value_codeable_concept = value_quantity.is_none().then(|| concept(record, "lab_value"));

    let observation = Observation {
        meta: meta.clone(),
        identifier: source_identifier(record),
        status: "final".to_string(),
        category: Vec::new(),
        code: CodeableConcept::from_coding(coding_or_na(record, "lab_type")),
        subject: context.subject_reference(),
        effective_date_time: effective.clone(),
        issued: None,
        value_quantity,
        value_codeable_concept,
        method: None,
        derived_from: Vec::new(),
    };

    let report = DiagnosticReport {
        meta,
        identifier: source_identifier(record),
        status: "final".to_string(),
        category: vec![
            CodeableConcept::from_coding(
                Coding::new(LAB_CATEGORY_SYSTEM, "LAB").with_display(Some("Laboratory".to_string())),
            )
            .with_text(Some("Laboratory".to_string())),
            named_concept(record, "lab_type"),
        ],
        code: concept(record, "lab_type"),
        subject: context.subject_reference(),
        effective_date_time: effective.clone(),
        issued: effective,
        result: Vec::new(),
    };

    Mapped::Linked {
        target: Resource::Observation(observation),
        referrer: Resource::DiagnosticReport(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::test_support::{record, to_json, with_context};
    use serde_json::{Value, json};

    fn pair(input: Value) -> (Value, Value) {
        with_context("", |ctx| match map_lab(&record(input), ctx) {
            Mapped::Linked { target, referrer } => (to_json(&target), to_json(&referrer)),
            Mapped::One(_) => panic!("labs map to a linked pair"),
        })
    }

    #[test]
    fn numeric_lab_with_comparator() {
        let (observation, report) = pair(json!({
            "lab_type_name": "Hemoglobin A1c",
            "lab_type_code": "4548-4",
            "lab_type_system": "http://loinc.org",
            "lab_value_quantity": "6.8",
            "quantity_comparator": ">=",
            "quantity_unit_name": "%",
            "effective_date_string": "2024-02-10T08:00:00Z",
        }));
        assert_eq!(observation["resourceType"], "Observation");
        assert_eq!(observation["status"], "final");
        assert_eq!(observation["valueQuantity"]["value"], 6.8);
        assert_eq!(observation["valueQuantity"]["comparator"], ">=");
        assert_eq!(observation["code"]["coding"][0]["code"], "4548-4");
        assert!(observation.get("valueCodeableConcept").is_none());

        assert_eq!(report["resourceType"], "DiagnosticReport");
        assert_eq!(report["category"][0]["coding"][0]["code"], "LAB");
        assert_eq!(report["category"][1]["text"], "Hemoglobin A1c");
        assert_eq!(report["effectiveDateTime"], "2024-02-10T08:00:00.000Z");
        assert_eq!(report["issued"], report["effectiveDateTime"]);
        assert!(report.get("result").is_none());
    }

    #[test]
    fn invalid_comparator_and_coded_value() {
        let (observation, _) = pair(json!({"lab_value_quantity": "5", "quantity_comparator": "~"}));
        assert!(observation["valueQuantity"].get("comparator").is_none());

        let (observation, report) = pair(json!({"lab_value_name": "Positive"}));
        assert!(observation.get("valueQuantity").is_none());
        assert_eq!(observation["valueCodeableConcept"]["coding"][0]["display"], "Positive");
        assert_eq!(observation["code"]["coding"][0]["display"], "N/A");
        assert!(report.get("effectiveDateTime").is_none());
        assert!(report.get("issued").is_none());
    }
}
