//! Comorbidities to Condition.

use fhir_model::{CodeableConcept, Condition, DomainRecord, Resource};

use crate::context::MappingContext;
use crate::fields::{code, concept, concept_map_tags, name, source_identifier};
use crate::mapped::Mapped;

const CONCEPT_MAPS: &[&str] = &["comorbidity", "comorbidity_class", "comorbidity_status"];

/// Class code `1` marks the primary comorbidity.
pub fn map_comorbidity(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let rank = if record.integer("comorbidity_class_code") == Some(1) {
        "Primary"
    } else {
        "Secondary"
    };
    let code_text = context.describe(
        code(record, "comorbidity").as_deref(),
        name(record, "comorbidity"),
    );

    Mapped::One(Resource::Condition(Condition {
        meta: Some(concept_map_tags(record, CONCEPT_MAPS)),
        identifier: source_identifier(record),
        clinical_status: Some(concept(record, "comorbidity_status")),
        category: vec![CodeableConcept::text_only(rank)],
        code: concept(record, "comorbidity").with_text(code_text),
        subject: context.subject_reference(),
        onset_date_time: record.timestamp("onset_date_string"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::test_support::{record, single, with_context};
    use serde_json::json;

    #[test]
    fn class_one_is_primary() {
        let json = with_context("", |ctx| {
            single(map_comorbidity(&record(json!({"comorbidity_class_code": "1"})), ctx))
        });
        assert_eq!(json["category"][0]["text"], "Primary");
        assert_eq!(json["clinicalStatus"]["coding"][0]["code"], "N/A");
    }

    #[test]
    fn other_classes_are_secondary() {
        for class in [json!("2"), json!("abc"), json!(null), json!(0)] {
            let json = with_context("", |ctx| {
                single(map_comorbidity(
                    &record(json!({"comorbidity_class_code": class})),
                    ctx,
                ))
            });
            assert_eq!(json["category"][0]["text"], "Secondary");
        }
    }

    #[test]
    fn description_looked_up_without_periods() {
        let json = with_context("I10     Essential (primary) hypertension\n", |ctx| {
            single(map_comorbidity(
                &record(json!({"comorbidity_code": "I.10", "comorbidity_name": "HTN"})),
                ctx,
            ))
        });
        assert_eq!(json["code"]["text"], "Essential (primary) hypertension");
        assert_eq!(json["code"]["coding"][0]["display"], "HTN");
    }
}
