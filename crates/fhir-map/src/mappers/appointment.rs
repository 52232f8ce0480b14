//! Encounter schedules to Appointment.

use fhir_model::{Appointment, AppointmentParticipant, DomainRecord, Resource};

use crate::context::MappingContext;
use crate::fields::{concept, concept_map_tags, enumerated, name, source_identifier};
use crate::mapped::Mapped;

const CONCEPT_MAPS: &[&str] = &["schedule", "schedule_status"];

const STATUSES: &[&str] = &[
    "proposed",
    "pending",
    "booked",
    "arrived",
    "fulfilled",
    "cancelled",
    "noshow",
    "entered-in-error",
    "checked-in",
    "waitlist",
];

/// The schedule date is both start and end of the appointment.
pub fn map_encounter_schedule(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let when = record.timestamp("effective_date_string");

    Mapped::One(Resource::Appointment(Appointment {
        meta: Some(concept_map_tags(record, CONCEPT_MAPS)),
        identifier: source_identifier(record),
        status: enumerated(name(record, "schedule_status"), STATUSES, "proposed"),
        description: name(record, "schedule"),
        start: when.clone(),
        end: when,
        participant: vec![AppointmentParticipant {
            actor: context.patient_reference(),
            status: "accepted".to_string(),
        }],
        service_type: vec![concept(record, "schedule")],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::test_support::{SUBJECT, record, single, with_context};
    use serde_json::json;

    #[test]
    fn known_status_is_lower_cased() {
        let json = with_context("", |ctx| {
            single(map_encounter_schedule(
                &record(json!({
                    "schedule_status_name": "Checked-In",
                    "schedule_name": "Infusion",
                    "effective_date_string": "2024-05-01 09:30:00",
                })),
                ctx,
            ))
        });
        assert_eq!(json["status"], "checked-in");
        assert_eq!(json["description"], "Infusion");
        assert_eq!(json["start"], "2024-05-01T09:30:00.000Z");
        assert_eq!(json["end"], json["start"]);
        assert_eq!(json["participant"][0]["actor"]["reference"], SUBJECT);
        assert_eq!(json["participant"][0]["actor"]["display"], "Patient");
        assert_eq!(json["participant"][0]["status"], "accepted");
    }

    #[test]
    fn unknown_status_defaults_to_proposed() {
        let json = with_context("", |ctx| {
            single(map_encounter_schedule(
                &record(json!({"schedule_status_name": "Rescheduled"})),
                ctx,
            ))
        });
        assert_eq!(json["status"], "proposed");
        assert!(json.get("start").is_none());
        assert!(json.get("end").is_none());
        assert_eq!(json["serviceType"][0]["coding"][0]["system"], "N/A");
        assert_eq!(json["meta"]["tag"][1]["code"], "N/A");
    }
}
