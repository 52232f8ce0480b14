//! Diagnoses and other diagnoses to Condition.

use fhir_model::{Condition, DomainRecord, Resource};

use crate::context::MappingContext;
use crate::fields::{
    code, concept, concept_map_tags, has_coded, name, named_concept, source_identifier,
};
use crate::mapped::Mapped;

pub fn map_diagnosis(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    condition(record, context, "diagnosis")
}

pub fn map_other_diagnosis(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    condition(record, context, "other_diagnosis")
}

/// Both domains share one shape under different field prefixes.
fn condition(record: &DomainRecord, context: &MappingContext<'_>, prefix: &str) -> Mapped {
    let status = format!("{prefix}_status");
    let class = format!("{prefix}_class");

    let code_text = context.describe(code(record, prefix).as_deref(), name(record, prefix));
    let clinical_status = has_coded(record, &status).then(|| named_concept(record, &status));

    Mapped::One(Resource::Condition(Condition {
        meta: Some(concept_map_tags(record, &[prefix, status.as_str(), class.as_str()])),
        identifier: source_identifier(record),
        clinical_status,
        category: vec![named_concept(record, &class)],
        code: concept(record, prefix).with_text(code_text),
        subject: context.subject_reference(),
        onset_date_time: record.timestamp("onset_date_string"),
    }))
}
