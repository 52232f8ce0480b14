use fhir_codes::{CodeLookup, ProcedureCodeTable};
use fhir_map::{Mapped, MappingContext, ResourceMapper, default_registry, map_patient};
use fhir_model::{ClinicalDomain, ClinicalExtract, DomainRecord, Resource};
use serde_json::{Value, json};

const SUBJECT: &str = "urn:uuid:00000000-0000-4000-8000-000000000001";

fn extract() -> ClinicalExtract {
    ClinicalExtract::from_value(&json!({
        "demographics": [{"first_name": "Ada", "last_name": "Byron"}],
        "clinical_domain": {
            "diagnoses": [
                {"diagnosis_code": "C50.9", "diagnosis_name": "Breast cancer"},
                {"diagnosis_code": "E11.9"}
            ],
            "labs": [{"lab_type_name": "Glucose", "lab_value_quantity": "101"}],
            "medications": [
                {"ordered_administered_flag": "MedicationOrdered", "medication_name": "Metformin"},
                {"medication_name": "Cisplatin"}
            ],
            "molecular_sequencings": [{"genetic_test_id": "TL-1"}],
            "vitals": []
        }
    }))
    .expect("valid extract")
}

#[test]
fn every_collection_maps_to_its_resource_types() {
    let extract = extract();
    let codes = CodeLookup::parse("E119    Type 2 diabetes mellitus without complications\n");
    let procedures = ProcedureCodeTable::empty();
    let context = MappingContext::new(SUBJECT, &codes, &procedures);
    let registry = default_registry();

    let mut lines = Vec::new();
    for domain in ClinicalDomain::ALL {
        let mapped = registry.map_records(domain, extract.collection(domain), &context);
        if mapped.is_empty() {
            continue;
        }
        let types: Vec<&str> = mapped
            .iter()
            .flat_map(Mapped::resources)
            .map(|resource| {
                assert_eq!(resource.subject_reference(), Some(SUBJECT));
                resource.resource_type()
            })
            .collect();
        lines.push(format!("{domain}: {}", types.join(", ")));
    }

    insta::assert_snapshot!(lines.join("\n"), @r"
    diagnoses: Condition, Condition
    labs: Observation, DiagnosticReport
    medications: MedicationRequest, MedicationAdministration
    molecular_sequencings: MolecularSequence, Observation
    ");
}

#[test]
fn code_lookup_enriches_diagnosis_text() {
    let extract = extract();
    let codes = CodeLookup::parse("E119    Type 2 diabetes mellitus without complications\n");
    let procedures = ProcedureCodeTable::empty();
    let context = MappingContext::new(SUBJECT, &codes, &procedures);

    let mapped = default_registry().map_records(
        ClinicalDomain::Diagnoses,
        extract.collection(ClinicalDomain::Diagnoses),
        &context,
    );
    let texts: Vec<_> = mapped
        .iter()
        .flat_map(Mapped::resources)
        .map(|resource| {
            let value = serde_json::to_value(resource).expect("serialize");
            value["code"]["text"].as_str().map(str::to_string)
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            Some("Breast cancer".to_string()),
            Some("Type 2 diabetes mellitus without complications".to_string()),
        ]
    );
}

fn tags(resource: &Resource) -> Vec<Value> {
    let value = serde_json::to_value(resource).expect("serialize");
    value["meta"]["tag"].as_array().cloned().unwrap_or_default()
}

#[test]
fn empty_records_tag_every_concept_map_as_na() {
    let codes = CodeLookup::empty();
    let procedures = ProcedureCodeTable::empty();
    let context = MappingContext::new(SUBJECT, &codes, &procedures);
    let empty = DomainRecord::default();

    let mut resources: Vec<Resource> = vec![Resource::Patient(map_patient(&empty))];
    for domain in ClinicalDomain::ALL {
        let mapper = default_registry().get(domain).expect("mapper registered");
        resources.extend(mapper.map(&empty, &context).resources().into_iter().cloned());
    }

    for resource in &resources {
        let tags = tags(resource);
        assert!(!tags.is_empty(), "{} has no tags", resource.resource_type());
        for tag in &tags {
            assert_eq!(tag["code"], "N/A", "{}: {tag}", resource.resource_type());
            assert!(
                tag["system"]
                    .as_str()
                    .is_some_and(|system| system.ends_with("_concept_map"))
            );
        }
    }
}

#[test]
fn mapping_a_record_twice_is_identical() {
    let extract = extract();
    let codes = CodeLookup::empty();
    let procedures = ProcedureCodeTable::empty();
    let context = MappingContext::new(SUBJECT, &codes, &procedures);
    let empty = DomainRecord::default();

    for domain in ClinicalDomain::ALL {
        let mapper = default_registry().get(domain).expect("mapper registered");
        for record in extract.collection(domain).iter().chain([&empty]) {
            assert_eq!(mapper.map(record, &context), mapper.map(record, &context));
        }
    }
    let demographics = extract.demographics.expect("demographics");
    assert_eq!(map_patient(&demographics), map_patient(&demographics));
}

#[test]
fn living_patient_has_false_deceased_flag() {
    for input in [json!({}), json!({"deceased": "no"}), json!({"deceased": 0})] {
        let Value::Object(fields) = input else {
            unreachable!("object literal");
        };
        let patient = map_patient(&DomainRecord::new(fields));
        let value = serde_json::to_value(&patient).expect("serialize");
        assert_eq!(value["deceasedBoolean"], false);
        assert!(value.get("deceasedDateTime").is_none());
    }
}
