//! Medications to MedicationRequest or MedicationAdministration.
//!
//! `ordered_administered_flag` decides the resource: ordered, prescribed and
//! requested medications become requests; everything else is treated as
//! administered.

use fhir_model::{
    AdministrationDosage, CodeableConcept, DomainRecord, Dosage, DoseAndRate,
    MedicationAdministration, MedicationRequest, Meta, Period, Quantity, Resource, Timing,
    TimingRepeat,
};

use crate::context::MappingContext;
use crate::fields::{concept, concept_map_tags, has_coded, named_concept, quantity, source_identifier};
use crate::mapped::Mapped;

const CONCEPT_MAPS: &[&str] = &["dosage_unit", "administration_route", "medication"];
const REQUEST_FLAGS: &[&str] = &["medicationordered", "medicationprescribed", "medicationrequest"];

pub fn map_medication(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let meta = concept_map_tags(record, CONCEPT_MAPS);
    let is_request = record
        .text("ordered_administered_flag")
        .is_some_and(|flag| REQUEST_FLAGS.contains(&flag.to_ascii_lowercase().as_str()));

    let resource = if is_request {
        Resource::MedicationRequest(request(record, context, meta))
    } else {
        Resource::MedicationAdministration(administration(record, context, meta))
    };
    Mapped::One(resource)
}

fn request(record: &DomainRecord, context: &MappingContext<'_>, meta: Meta) -> MedicationRequest {
    let start = record.timestamp("medication_start_date_string");
    let end = record.timestamp("medication_end_date_string");
    let repeat_count = record.text("dosage_timing_repeat_count");

    let timing = (repeat_count.is_some() || start.is_some() || end.is_some()).then(|| Timing {
        repeat: Some(TimingRepeat {
            frequency: frequency(record),
            bounds_period: Period::from_bounds(start.clone(), end),
        }),
    });

    let dosage = Dosage {
        patient_instruction: repeat_count,
        timing,
        route: route(record),
        dose_and_rate: dose(record)
            .map(|dose_quantity| DoseAndRate {
                dose_quantity: Some(dose_quantity),
            })
            .into_iter()
            .collect(),
    };

    MedicationRequest {
        meta: Some(meta),
        identifier: source_identifier(record),
        status: "active".to_string(),
        intent: "order".to_string(),
        medication_codeable_concept: concept(record, "medication"),
        subject: context.subject_reference(),
        authored_on: start,
        dosage_instruction: (dosage != Dosage::default())
            .then_some(dosage)
            .into_iter()
            .collect(),
    }
}

fn administration(
    record: &DomainRecord,
    context: &MappingContext<'_>,
    meta: Meta,
) -> MedicationAdministration {
    let start = record.timestamp("medication_start_date_string");
    let end = record.timestamp("medication_end_date_string");
    let (effective_date_time, effective_period) = match (start, end) {
        (Some(start), None) => (Some(start), None),
        (Some(start), Some(end)) => (
            None,
            Some(Period {
                start: Some(start),
                end: Some(end),
            }),
        ),
        (None, end) => (None, Period::from_bounds(None, end)),
    };

    let dosage = AdministrationDosage {
        text: record.text("dosage_timing_repeat_count"),
        route: route(record),
        dose: dose(record),
    };
    let dosage = (dosage != AdministrationDosage::default()).then_some(dosage);

    MedicationAdministration {
        meta: Some(meta),
        identifier: source_identifier(record),
        status: "completed".to_string(),
        category: has_coded(record, "medication").then(|| named_concept(record, "medication")),
        medication_codeable_concept: concept(record, "medication"),
        subject: context.subject_reference(),
        effective_date_time,
        effective_period,
        dosage,
    }
}

/// Dose quantity; zero or non-numeric doses are omitted.
fn dose(record: &DomainRecord) -> Option<Quantity> {
    quantity(record, "dosage_quantity", "dosage_unit").filter(|q| q.value.is_some_and(|v| v != 0.0))
}

fn route(record: &DomainRecord) -> Option<CodeableConcept> {
    record
        .has("administration_route_name")
        .then(|| concept(record, "administration_route"))
}

fn frequency(record: &DomainRecord) -> Option<u32> {
    record
        .integer("dosage_timing_repeat_count")
        .and_then(|count| u32::try_from(count).ok())
        .filter(|count| *count > 0)
}
