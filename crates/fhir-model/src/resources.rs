//! Typed FHIR R4 resources produced by the mappers.
//!
//! Only the members the bundler populates are modelled. Resources carry no
//! `id`; entries are addressed by their bundle `fullUrl`.

use serde::{Deserialize, Serialize};

use crate::datatypes::{
    AdministrationDosage, Address, AppointmentParticipant, Attachment, CodeableConcept, Coding,
    DocumentContent, Dosage, Extension, FamilyMemberCondition, HumanName, Identifier, Meta,
    Period, Quantity, Reference, SequenceQuality,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased_boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub derived_from: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_site: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    pub class: Coding,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub encounter_type: Vec<CodeableConcept>,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub participant: Vec<AppointmentParticipant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_type: Vec<CodeableConcept>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    pub intent: String,
    pub medication_codeable_concept: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<Dosage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdministration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CodeableConcept>,
    pub medication_codeable_concept: CodeableConcept,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<AdministrationDosage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    pub patient: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub relationship: CodeableConcept,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<FamilyMemberCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MolecularSequence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    pub patient: Reference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality: Vec<SequenceQuality>,
    pub coordinate_system: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub subject: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub content: Vec<DocumentContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    pub content_type: String,
    pub data: String,
}

/// Any resource the bundler can emit, tagged by `resourceType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Condition(Condition),
    Observation(Observation),
    DiagnosticReport(DiagnosticReport),
    Procedure(Procedure),
    Encounter(Encounter),
    Appointment(Appointment),
    MedicationRequest(MedicationRequest),
    MedicationAdministration(MedicationAdministration),
    FamilyMemberHistory(FamilyMemberHistory),
    MolecularSequence(MolecularSequence),
    DocumentReference(DocumentReference),
    Binary(Binary),
}

impl Resource {
    /// The FHIR `resourceType`, also used as the transaction request URL.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::Patient(_) => "Patient",
            Self::Condition(_) => "Condition",
            Self::Observation(_) => "Observation",
            Self::DiagnosticReport(_) => "DiagnosticReport",
            Self::Procedure(_) => "Procedure",
            Self::Encounter(_) => "Encounter",
            Self::Appointment(_) => "Appointment",
            Self::MedicationRequest(_) => "MedicationRequest",
            Self::MedicationAdministration(_) => "MedicationAdministration",
            Self::FamilyMemberHistory(_) => "FamilyMemberHistory",
            Self::MolecularSequence(_) => "MolecularSequence",
            Self::DocumentReference(_) => "DocumentReference",
            Self::Binary(_) => "Binary",
        }
    }

    /// The reference pointing at the patient, if this resource has one.
    pub fn subject_reference(&self) -> Option<&str> {
        let reference = match self {
            Self::Patient(_) | Self::Binary(_) => return None,
            Self::Condition(r) => &r.subject,
            Self::Observation(r) => &r.subject,
            Self::DiagnosticReport(r) => &r.subject,
            Self::Procedure(r) => &r.subject,
            Self::Encounter(r) => &r.subject,
            Self::Appointment(r) => return r.participant.first().map(|p| p.actor.reference.as_str()),
            Self::MedicationRequest(r) => &r.subject,
            Self::MedicationAdministration(r) => &r.subject,
            Self::FamilyMemberHistory(r) => &r.patient,
            Self::MolecularSequence(r) => &r.patient,
            Self::DocumentReference(r) => &r.subject,
        };
        Some(reference.reference.as_str())
    }

    /// Points this resource at a linked entry.
    ///
    /// Returns `false` when the resource type carries no link slot.
    pub fn link_to(&mut self, full_url: &str) -> bool {
        match self {
            Self::DiagnosticReport(report) => {
                report.result.push(Reference::to(full_url));
                true
            }
            Self::Observation(observation) => {
                observation.derived_from.push(Reference::to(full_url));
                true
            }
            Self::DocumentReference(document) => match document.content.first_mut() {
                Some(content) => {
                    content.attachment.url = Some(full_url.to_string());
                    true
                }
                None => {
                    document.content.push(DocumentContent {
                        attachment: Attachment {
                            url: Some(full_url.to_string()),
                            ..Attachment::default()
                        },
                    });
                    true
                }
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> DiagnosticReport {
        DiagnosticReport {
            meta: None,
            identifier: Vec::new(),
            status: "final".to_string(),
            category: Vec::new(),
            code: CodeableConcept::default(),
            subject: Reference::to("urn:uuid:patient"),
            effective_date_time: None,
            issued: None,
            result: Vec::new(),
        }
    }

    #[test]
    fn resource_type_tag_is_serialized() {
        let json = serde_json::to_value(Resource::DiagnosticReport(report())).expect("serialize");
        assert_eq!(json["resourceType"], "DiagnosticReport");
        assert_eq!(json["subject"]["reference"], "urn:uuid:patient");
        assert!(json.get("result").is_none());
        assert!(json.get("effectiveDateTime").is_none());
    }

    #[test]
    fn link_to_fills_report_result() {
        let mut resource = Resource::DiagnosticReport(report());
        assert!(resource.link_to("urn:uuid:obs"));
        let Resource::DiagnosticReport(report) = resource else {
            panic!("variant changed");
        };
        assert_eq!(report.result[0].reference, "urn:uuid:obs");
    }

    #[test]
    fn link_to_sets_document_attachment_url() {
        let mut resource = Resource::DocumentReference(DocumentReference {
            identifier: Vec::new(),
            status: "current".to_string(),
            category: Vec::new(),
            subject: Reference::to("urn:uuid:patient"),
            date: None,
            content: vec![DocumentContent {
                attachment: Attachment::default(),
            }],
        });
        assert!(resource.link_to("urn:uuid:bin"));
        let Resource::DocumentReference(document) = resource else {
            panic!("variant changed");
        };
        assert_eq!(document.content[0].attachment.url.as_deref(), Some("urn:uuid:bin"));
    }

    #[test]
    fn binary_has_no_subject_or_link() {
        let mut binary = Resource::Binary(Binary {
            content_type: "text/plain".to_string(),
            data: String::new(),
        });
        assert!(binary.subject_reference().is_none());
        assert!(!binary.link_to("urn:uuid:x"));
    }

    #[test]
    fn encounter_type_uses_reserved_name() {
        let encounter = Encounter {
            meta: None,
            identifier: Vec::new(),
            status: "unknown".to_string(),
            class: Coding::new("N/A", "N/A"),
            encounter_type: vec![CodeableConcept::text_only("Office visit")],
            subject: Reference::to("urn:uuid:patient"),
            period: None,
        };
        let json = serde_json::to_value(&encounter).expect("serialize");
        assert_eq!(json["type"][0]["text"], "Office visit");
        assert_eq!(json["class"]["code"], "N/A");
    }
}
