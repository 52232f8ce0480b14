//! Assessments to Observation.

use fhir_model::{DomainRecord, Observation, Resource};

use crate::context::MappingContext;
use crate::fields::{concept, concept_map_tags, quantity, source_identifier};
use crate::mapped::Mapped;

const CONCEPT_MAPS: &[&str] = &["quantity_unit", "assessment_value", "assessment_type"];

pub fn map_assessment(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let value_quantity = quantity(record, "assessment_value_quantity", "quantity_unit");
    let value_codeable_concept = value_quantity
        .is_none()
        .then(|| concept(record, "assessment_value"));

    Mapped::One(Resource::Observation(Observation {
        meta: Some(concept_map_tags(record, CONCEPT_MAPS)),
        identifier: source_identifier(record),
        status: "unknown".to_string(),
        category: Vec::new(),
        code: concept(record, "assessment_type"),
        subject: context.subject_reference(),
        effective_date_time: record.timestamp("effective_date_string"),
        issued: record.timestamp("assessment_date"),
        value_quantity,
        value_codeable_concept,
        method: None,
        derived_from: Vec::new(),
    }))
}
