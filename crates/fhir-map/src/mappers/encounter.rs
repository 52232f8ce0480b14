//! Encounters to Encounter.

use fhir_model::{DomainRecord, Encounter, Period, Resource};

use crate::context::MappingContext;
use crate::fields::{coding, concept_map_tags, enumerated, named_concept, source_identifier};
use crate::mapped::Mapped;

const STATUSES: &[&str] = &[
    "planned",
    "arrived",
    "triaged",
    "in-progress",
    "onleave",
    "finished",
    "cancelled",
    "entered-in-error",
    "unknown",
];

pub fn map_encounter(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    Mapped::One(Resource::Encounter(Encounter {
        meta: Some(concept_map_tags(record, &["encounter"])),
        identifier: source_identifier(record),
        status: enumerated(record.text("encounter_status_name"), STATUSES, "unknown"),
        class: coding(record, "encounter"),
        encounter_type: vec![named_concept(record, "encounter")],
        subject: context.patient_reference(),
        period: Period::from_bounds(record.timestamp("effective_date_string"), None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::test_support::{record, single, with_context};
    use serde_json::json;

    #[test]
    fn status_defaults_to_unknown() {
        let json = with_context("", |ctx| {
            single(map_encounter(
                &record(json!({
                    "encounter_name": "Office Visit",
                    "encounter_code": "AMB",
                    "effective_date_string": "2022-11-30",
                })),
                ctx,
            ))
        });
        assert_eq!(json["status"], "unknown");
        assert_eq!(json["class"]["code"], "AMB");
        assert_eq!(json["class"]["system"], "N/A");
        assert_eq!(json["type"][0]["text"], "Office Visit");
        assert_eq!(json["period"]["start"], "2022-11-30T00:00:00.000Z");
        assert_eq!(json["subject"]["display"], "Patient");
    }

    #[test]
    fn valid_status_is_kept_and_missing_date_drops_period() {
        let json = with_context("", |ctx| {
            single(map_encounter(&record(json!({"encounter_status_name": "FINISHED"})), ctx))
        });
        assert_eq!(json["status"], "finished");
        assert!(json.get("period").is_none());
    }
}
