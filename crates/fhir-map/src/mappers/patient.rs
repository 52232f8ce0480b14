//! Demographics to Patient.

use fhir_model::{Address, DomainRecord, Extension, HumanName, Identifier, Patient};

use crate::fields::{coding, concept_map_tags, source_identifier};

const MRN_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
const US_CORE_SEX: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-sex";
const US_CORE_RACE: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race";
const US_CORE_ETHNICITY: &str =
    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";

const CONCEPT_MAPS: &[&str] = &["gender", "ethnicity", "race"];

/// Maps the patient's demographics record.
///
/// Accepts both the extract spelling (`family_name`, `date_of_birth_string`)
/// and the consolidated-demographics spelling (`last_name`, `date_of_birth`,
/// `dob`).
pub fn map_patient(record: &DomainRecord) -> Patient {
    let mut identifier = source_identifier(record);
    if let Some(mrn) = record.text("mrn") {
        identifier.push(Identifier::new(Some(MRN_SYSTEM.to_string()), mrn));
    }

    let family = record
        .text("family_name")
        .or_else(|| record.text("last_name"));
    let given: Vec<String> = record.text("first_name").into_iter().collect();
    let name = if family.is_some() || !given.is_empty() {
        vec![HumanName { family, given }]
    } else {
        Vec::new()
    };

    let state = record.text("state");
    let postal_code = record.text("postal_code");
    let address = if state.is_some() || postal_code.is_some() {
        vec![Address { state, postal_code }]
    } else {
        Vec::new()
    };

    let birth_date = ["date_of_birth_string", "date_of_birth", "dob"]
        .iter()
        .find_map(|key| record.date(key));

    let (deceased_date_time, deceased_boolean) = match record.timestamp("date_of_death_string") {
        Some(died) => (Some(died), None),
        None => (None, Some(record.flag("deceased"))),
    };

    Patient {
        meta: Some(concept_map_tags(record, CONCEPT_MAPS)),
        identifier,
        extension: vec![
            Extension::coding(US_CORE_SEX, coding(record, "gender")),
            Extension::coding(US_CORE_RACE, coding(record, "race")),
            Extension::coding(US_CORE_ETHNICITY, coding(record, "ethnicity")),
        ],
        name,
        gender: administrative_gender(record),
        birth_date,
        deceased_boolean,
        deceased_date_time,
        address,
    }
}

/// FHIR administrative gender; unrecognized values become `unknown`.
fn administrative_gender(record: &DomainRecord) -> Option<String> {
    let value = record
        .text("gender_name")
        .or_else(|| record.text("gender_code"))
        .or_else(|| record.text("gender"))?;
    let gender = match value.to_ascii_lowercase().as_str() {
        "male" | "m" => "male",
        "female" | "f" => "female",
        "other" | "o" => "other",
        _ => "unknown",
    };
    Some(gender.to_string())
}
