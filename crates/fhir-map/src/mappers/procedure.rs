//! Other procedures and surgeries to Procedure.

use fhir_model::{CodeableConcept, Coding, DomainRecord, Procedure, Resource};

use crate::context::MappingContext;
use crate::fields::{
    code, concept_map_tags, has_coded, name, named_concept, not_available, source_identifier,
};
use crate::mapped::Mapped;

const SNOMED: &str = "http://snomed.info/sct";

pub fn map_other_procedure(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    Mapped::One(Resource::Procedure(Procedure {
        meta: Some(concept_map_tags(record, &["other_procedure"])),
        ..procedure(record, context, "other_procedure")
    }))
}

pub fn map_surgery(record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
    let category = CodeableConcept::from_coding(
        Coding::new(SNOMED, "387713003").with_display(Some("Surgical procedure".to_string())),
    )
    .with_text(Some("Surgical procedure".to_string()));
    let body_site = if has_coded(record, "body_site") {
        vec![named_concept(record, "body_site")]
    } else {
        Vec::new()
    };

    Mapped::One(Resource::Procedure(Procedure {
        meta: Some(concept_map_tags(record, &["surgery", "body_site"])),
        category: Some(category),
        body_site,
        ..procedure(record, context, "surgery")
    }))
}

/// Shared shape; the code display and text carry the resolved name.
fn procedure(record: &DomainRecord, context: &MappingContext<'_>, prefix: &str) -> Procedure {
    let resolved = context
        .procedure_name(code(record, prefix).as_deref(), name(record, prefix).as_deref())
        .unwrap_or_else(not_available);
    let coding = Coding::new(
        record.text_or_na(&format!("{prefix}_system")),
        record.text_or_na(&format!("{prefix}_code")),
    )
    .with_display(Some(resolved.clone()));

    Procedure {
        meta: None,
        identifier: source_identifier(record),
        extension: Vec::new(),
        status: "completed".to_string(),
        category: None,
        code: CodeableConcept::from_coding(coding).with_text(Some(resolved)),
        subject: context.subject_reference(),
        performed_date_time: record.timestamp("performed_date_string"),
        performed_period: None,
        body_site: Vec::new(),
        reason_code: Vec::new(),
    }
}
