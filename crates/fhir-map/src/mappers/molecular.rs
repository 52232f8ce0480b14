//! Molecular sequencing to a MolecularSequence plus the Observation derived
//! from it.

use fhir_model::{
    CodeableConcept, Coding, DomainRecord, Extension, Identifier, MolecularSequence, Observation,
    Resource, SequenceQuality,
};

use crate::context::MappingContext;
use crate::fields::{
    coding_or_na, comparator, concept_map_tags, concept_or_na, not_available, quantity,
    source_identifier,
};
use crate::mapped::Mapped;

const SEQUENCING_TYPE_URL: &str =
    "http://hl7.org/fhir/us/mcode/StructureDefinition/mcode-sequencing-type";
const OBSERVATION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/observation-category";
const GENETIC_TEST_SYSTEM: &str = "tempus";
const CONCEPT_MAPS: &[&str] = &[
    "sequencing_type",
    "sequencing_unit",
    "sequencing_value",
    "method",
];

/// The observation's `derivedFrom` is filled in by the assembler with the
/// sequence's `fullUrl`.
pub fn map_molecular_sequencing(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let meta = Some(concept_map_tags(record, CONCEPT_MAPS));
    let method = concept_or_na(record, "method");

    let mut identifier = source_identifier(record);
    identifier.push(Identifier::new(
        Some(GENETIC_TEST_SYSTEM.to_string()),
        record.text_or_na("genetic_test_id"),
    ));

    let sequence = MolecularSequence {
        meta: meta.clone(),
        identifier,
        extension: vec![Extension::coding(
            SEQUENCING_TYPE_URL,
            coding_or_na(record, "sequencing_type"),
        )],
        patient: context.subject_reference(),
        quality: vec![SequenceQuality {
            quality_type: "unknown".to_string(),
            method: Some(method.clone()),
        }],
        coordinate_system: 0,
    };

    let value_quantity =
        quantity(record, "sequencing_value_quantity", "sequencing_unit").map(|mut q| {
            q.comparator = comparator(record, "quantity_comparator");
            q.unit = Some(q.unit.unwrap_or_else(not_available));
            q
        });
    let value_codeable_concept =
        value_quantity.is_none().then(|| concept_or_na(record, "sequencing_value"));

    let observation = Observation {
        meta,
        identifier: source_identifier(record),
        status: "final".to_string(),
        category: vec![
            CodeableConcept::from_coding(
                Coding::new(OBSERVATION_CATEGORY, "laboratory")
                    .with_display(Some("Laboratory".to_string())),
            )
            .with_text(Some("Laboratory".to_string())),
        ],
        code: CodeableConcept::from_coding(
            Coding::new("http://loinc.org", "81247-9")
                .with_display(Some("Molecular genetics study report panel".to_string())),
        )
        .with_text(Some("Molecular genetics study report panel".to_string())),
        subject: context.subject_reference(),
        effective_date_time: record.timestamp("effective_date_string"),
        issued: None,
        value_quantity,
        value_codeable_concept,
        method: Some(method),
        derived_from: Vec::new(),
    };

    Mapped::Linked {
        target: Resource::MolecularSequence(sequence),
        referrer: Resource::Observation(observation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::test_support::{SUBJECT, record, to_json, with_context};
    use serde_json::{Value, json};

    fn pair(input: Value) -> (Value, Value) {
        with_context("", |ctx| match map_molecular_sequencing(&record(input), ctx) {
            Mapped::Linked { target, referrer } => (to_json(&target), to_json(&referrer)),
            Mapped::One(_) => panic!("molecular sequencing maps to a linked pair"),
        })
    }

    #[test]
    fn sequence_and_observation() {
        let (sequence, observation) = pair(json!({
            "trg_row_ice_id": "row-9",
            "trg_source_system_name": "onco",
            "genetic_test_id": "TL-22-0001",
            "sequencing_type_name": "Whole exome",
            "sequencing_value_name": "KRAS G12C detected",
            "method_name": "NGS",
            "effective_date_string": "2022-05-01",
        }));
        assert_eq!(sequence["resourceType"], "MolecularSequence");
        assert_eq!(sequence["coordinateSystem"], 0);
        assert_eq!(sequence["identifier"][1], json!({"system": "tempus", "value": "TL-22-0001"}));
        assert_eq!(sequence["extension"][0]["valueCoding"]["display"], "Whole exome");
        assert_eq!(sequence["quality"][0]["type"], "unknown");
        assert_eq!(sequence["quality"][0]["method"]["text"], "NGS");
        assert_eq!(sequence["patient"]["reference"], SUBJECT);

        assert_eq!(observation["code"]["coding"][0]["code"], "81247-9");
        assert_eq!(observation["valueCodeableConcept"]["text"], "KRAS G12C detected");
        assert_eq!(observation["method"]["coding"][0]["display"], "NGS");
        assert_eq!(observation["effectiveDateTime"], "2022-05-01T00:00:00.000Z");
        assert!(observation.get("derivedFrom").is_none());
        assert_eq!(observation["meta"]["tag"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn numeric_value_and_missing_test_id() {
        let (sequence, observation) = pair(json!({
            "sequencing_value_quantity": "12.5",
            "quantity_comparator": "<",
        }));
        assert_eq!(sequence["identifier"][0]["value"], "N/A");
        assert_eq!(observation["valueQuantity"]["value"], 12.5);
        assert_eq!(observation["valueQuantity"]["comparator"], "<");
        assert_eq!(observation["valueQuantity"]["unit"], "N/A");
        assert!(observation.get("valueCodeableConcept").is_none());
    }
}
