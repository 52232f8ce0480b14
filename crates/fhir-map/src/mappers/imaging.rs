//! Imaging to DiagnosticReport.

use fhir_model::{CodeableConcept, Coding, DiagnosticReport, DomainRecord, Resource};

use crate::context::MappingContext;
use crate::fields::{concept, concept_map_tags, source_identifier};
use crate::mapped::Mapped;

pub fn map_imaging(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    Mapped::One(Resource::DiagnosticReport(DiagnosticReport {
        meta: Some(concept_map_tags(record, &["imaging"])),
        identifier: source_identifier(record),
        status: "final".to_string(),
        category: vec![
            CodeableConcept::from_coding(Coding::code_only("Imaging"))
                .with_text(Some("Imaging".to_string())),
        ],
        code: concept(record, "imaging"),
        subject: context.subject_reference(),
        effective_date_time: record.timestamp("performed_date_string"),
        issued: None,
        result: Vec::new(),
    }))
}
