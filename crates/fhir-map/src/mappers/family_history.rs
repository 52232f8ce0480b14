//! Family member history to FamilyMemberHistory.

use fhir_model::{DomainRecord, FamilyMemberCondition, FamilyMemberHistory, Resource};

use crate::context::MappingContext;
use crate::fields::{code, concept, concept_map_tags, has_coded, name, named_concept, source_identifier};
use crate::mapped::Mapped;

const TYPE: &str = "family_member_history_type";
const CONDITION: &str = "family_member_history_condition";

pub fn map_family_member_history(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let condition = if has_coded(record, CONDITION) {
        let text = context.describe(code(record, CONDITION).as_deref(), name(record, CONDITION));
        vec![FamilyMemberCondition {
            code: concept(record, CONDITION).with_text(text),
        }]
    } else {
        Vec::new()
    };

    Mapped::One(Resource::FamilyMemberHistory(FamilyMemberHistory {
        meta: Some(concept_map_tags(record, &[TYPE, CONDITION])),
        identifier: source_identifier(record),
        status: "health-unknown".to_string(),
        patient: context.patient_reference(),
        date: record.timestamp("effective_date_string"),
        relationship: named_concept(record, TYPE),
        condition,
    }))
}
