//! One mapper per clinical domain.
//!
//! | Domain                | Resource(s)                                  |
//! |-----------------------|----------------------------------------------|
//! | demographics          | Patient                                      |
//! | diagnoses             | Condition                                    |
//! | assessments           | Observation                                  |
//! | comorbidities         | Condition                                    |
//! | encounter_schedules   | Appointment                                  |
//! | encounters            | Encounter                                    |
//! | family_member_history | FamilyMemberHistory                          |
//! | imagings              | DiagnosticReport                             |
//! | labs                  | Observation + DiagnosticReport               |
//! | medications           | MedicationRequest / MedicationAdministration |
//! | other_diagnoses       | Condition                                    |
//! | other_procedures      | Procedure                                    |
//! | vitals                | Observation                                  |
//! | surgeries             | Procedure                                    |
//! | molecular_sequencings | MolecularSequence + Observation              |
//! | radiotherapies        | Procedure                                    |

pub mod appointment;
pub mod assessment;
pub mod comorbidity;
pub mod diagnosis;
pub mod encounter;
pub mod family_history;
pub mod imaging;
pub mod lab;
pub mod medication;
pub mod molecular;
pub mod patient;
pub mod procedure;
pub mod radiotherapy;
pub mod vitals;

#[cfg(test)]
pub(crate) mod test_support {
    use fhir_codes::{CodeLookup, ProcedureCodeTable};
    use fhir_model::{DomainRecord, Resource};
    use serde_json::Value;

    use crate::context::MappingContext;
    use crate::mapped::Mapped;

    pub const SUBJECT: &str = "urn:uuid:11111111-1111-4111-8111-111111111111";

    pub fn record(value: Value) -> DomainRecord {
        match value {
            Value::Object(fields) => DomainRecord::new(fields),
            _ => panic!("test record must be an object"),
        }
    }

    /// Runs `f` with a context carrying the given code list.
    pub fn with_context<T>(codes: &str, f: impl FnOnce(&MappingContext<'_>) -> T) -> T {
        let codes = CodeLookup::parse(codes);
        let procedures = ProcedureCodeTable::empty();
        f(&MappingContext::new(SUBJECT, &codes, &procedures))
    }

    pub fn single(mapped: Mapped) -> Value {
        match mapped {
            Mapped::One(resource) => to_json(&resource),
            Mapped::Linked { .. } => panic!("expected a single resource"),
        }
    }

    pub fn to_json(resource: &Resource) -> Value {
        serde_json::to_value(resource).expect("serialize resource")
    }
}
