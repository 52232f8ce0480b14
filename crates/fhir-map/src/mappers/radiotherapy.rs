//! Radiotherapy courses to Procedure.

use fhir_model::{
    CodeableConcept, Coding, DomainRecord, Extension, Period, Procedure, Quantity, Resource,
};

use crate::context::MappingContext;
use crate::fields::{coding_or_na, concept_map_tags, concept_or_na, source_identifier};
use crate::mapped::Mapped;

const DOSE_DELIVERED_URL: &str =
    "http://hl7.org/fhir/us/mcode/StructureDefinition/mcode-radiotherapy-dose-delivered-to-volume";
const CONCEPT_MAPS: &[&str] = &[
    "body_site",
    "radiotherapy_technique",
    "dosage_unit",
    "radiotherapy",
    "radiotherapy_treatment_intent",
];

pub fn map_radiotherapy(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let technique = coding_or_na(record, "radiotherapy_technique");
    let category = CodeableConcept {
        coding: vec![
            Coding::new("http://snomed.info/sct", "367336001")
                .with_display(Some("Radiotherapy procedure (procedure)".to_string())),
            technique,
        ],
        text: Some(record.text_or_na("radiotherapy_technique_name")),
    };

    let body_site = if record.has("body_site_code") {
        vec![concept_or_na(record, "body_site")]
    } else {
        Vec::new()
    };

    Mapped::One(Resource::Procedure(Procedure {
        meta: Some(concept_map_tags(record, CONCEPT_MAPS)),
        identifier: source_identifier(record),
        extension: vec![
            dose_delivered(record),
            Extension::string(
                "ordered_administered_flag",
                record.text_or_na("ordered_administered_flag"),
            ),
        ],
        status: "completed".to_string(),
        category: Some(category),
        code: CodeableConcept::from_coding(coding_or_na(record, "radiotherapy")),
        subject: context.subject_reference(),
        performed_date_time: None,
        performed_period: Period::from_bounds(
            record.timestamp("radiotherapy_start_date_string"),
            record.timestamp("radiotherapy_end_date_string"),
        ),
        body_site,
        reason_code: vec![concept_or_na(record, "radiotherapy_treatment_intent")],
    }))
}

/// Total dose and fraction count; each nested member only when the source
/// value parses.
fn dose_delivered(record: &DomainRecord) -> Extension {
    let mut nested = Vec::new();
    if let Some(value) = record.number("dose_quantity") {
        nested.push(Extension {
            value_quantity: Some(Quantity {
                value: Some(value),
                comparator: None,
                unit: Some(record.text_or_na("dosage_unit_name")),
                system: Some(record.text_or_na("dosage_unit_system")),
                code: Some(record.text_or_na("dosage_unit_code")),
            }),
            ..Extension::new("totalDoseDelivered")
        });
    }
    if let Some(fractions) = record
        .integer("fraction")
        .and_then(|count| u32::try_from(count).ok())
        .filter(|count| *count > 0)
    {
        nested.push(Extension {
            value_positive_int: Some(fractions),
            ..Extension::new("numberOfFractionsDelivered")
        });
    }
    Extension {
        extension: nested,
        ..Extension::new(DOSE_DELIVERED_URL)
    }
}
