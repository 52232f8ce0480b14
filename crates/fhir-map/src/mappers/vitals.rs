//! Vitals to Observation.

use fhir_model::{CodeableConcept, Coding, DomainRecord, Observation, Resource};

use crate::context::MappingContext;
use crate::fields::{code, concept_map_tags, name, not_available, quantity, source_identifier};
use crate::mapped::Mapped;

const OBSERVATION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/observation-category";

pub fn map_vitals(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let label = name(record, "vitals_type")
        .or_else(|| code(record, "vitals_type"))
        .unwrap_or_else(not_available);
    let coding = Coding::new(
        record.text_or_na("vitals_type_system"),
        record.text_or_na("vitals_type_code"),
    )
    .with_display(Some(label.clone()));

    let value_quantity = quantity(record, "vitals_value_quantity", "quantity_unit").map(|mut q| {
        q.unit = Some(q.unit.unwrap_or_else(not_available));
        q
    });

    Mapped::One(Resource::Observation(Observation {
        meta: Some(concept_map_tags(
            record,
            &["vitals_type", "vitals_value", "quantity_unit"],
        )),
        identifier: source_identifier(record),
        status: "final".to_string(),
        category: vec![
            CodeableConcept::from_coding(
                Coding::new(OBSERVATION_CATEGORY, "vital-signs")
                    .with_display(Some("Vital Signs".to_string())),
            )
            .with_text(Some("Vital Signs".to_string())),
        ],
        code: CodeableConcept::from_coding(coding).with_text(Some(label)),
        subject: context.subject_reference(),
        effective_date_time: record.timestamp("effective_date_string"),
        issued: None,
        value_quantity,
        value_codeable_concept: None,
        method: None,
        derived_from: Vec::new(),
    }))
}
