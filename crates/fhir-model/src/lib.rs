pub mod bundle;
pub mod datatypes;
pub mod datetime;
pub mod domain;
pub mod error;
pub mod extract;
pub mod redact;
pub mod resources;

pub use bundle::{Bundle, BundleEntry, BundleRequest, BundleType};
pub use datatypes::{
    AdministrationDosage, Address, AppointmentParticipant, Attachment, CodeableConcept, Coding,
    DocumentContent, DoseAndRate, Dosage, Extension, FamilyMemberCondition, HumanName, Identifier,
    Meta, Period, Quantity, Reference, SequenceQuality, Timing, TimingRepeat,
};
pub use datetime::{normalize_date, normalize_timestamp, parse_timestamp};
pub use domain::ClinicalDomain;
pub use error::{ExtractError, Result};
pub use extract::{ClinicalExtract, DomainRecord, NoteRecord};
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data};
pub use resources::{
    Appointment, Binary, Condition, DiagnosticReport, DocumentReference, Encounter,
    FamilyMemberHistory, MedicationAdministration, MedicationRequest, MolecularSequence,
    Observation, Patient, Procedure, Resource,
};

/// Placeholder for required coding members that the source did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_serializes_as_transaction() {
        let bundle = Bundle::transaction(vec![BundleEntry::post(
            "urn:uuid:1",
            Resource::Binary(Binary {
                content_type: "text/plain".to_string(),
                data: "aGk=".to_string(),
            }),
        )]);
        let json = serde_json::to_value(&bundle).expect("serialize bundle");
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["type"], "transaction");
        assert_eq!(json["entry"][0]["fullUrl"], "urn:uuid:1");
        assert_eq!(json["entry"][0]["request"]["method"], "POST");
        assert_eq!(json["entry"][0]["request"]["url"], "Binary");
        assert_eq!(json["entry"][0]["resource"]["resourceType"], "Binary");
    }
}
