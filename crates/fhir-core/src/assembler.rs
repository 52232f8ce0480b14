//! Patient bundle assembly.
//!
//! The Patient entry comes first and its `fullUrl` is the subject of every
//! other entry. Domains follow in [`ClinicalDomain::ALL`] order, then notes;
//! the worker appends attachments last.

use fhir_codes::{CodeLookup, ProcedureCodeTable};
use fhir_map::{MapperRegistry, Mapped, MappingContext, map_patient};
use fhir_model::{Bundle, BundleEntry, ClinicalDomain, ClinicalExtract, Patient, Resource};
use tracing::{debug, warn};

use crate::error::AssembleError;
use crate::ids::IdGenerator;
use crate::notes::note_documents;

/// Entries of one bundle under construction.
#[derive(Debug)]
pub struct BundleBuilder {
    subject: String,
    entries: Vec<BundleEntry>,
}

impl BundleBuilder {
    /// Starts a bundle with the patient entry at `subject`.
    pub fn new(patient: Patient, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        let entries = vec![BundleEntry::post(
            subject.clone(),
            Resource::Patient(patient),
        )];
        Self { subject, entries }
    }

    /// The patient's `fullUrl`.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Appends a mapper output.
    ///
    /// For a linked pair the target goes first and the referrer is pointed at
    /// the target's `fullUrl`.
    pub fn push(&mut self, mapped: Mapped, ids: &mut IdGenerator) {
        match mapped {
            Mapped::One(resource) => {
                self.entries
                    .push(BundleEntry::post(ids.next_full_url(), resource));
            }
            Mapped::Linked {
                target,
                mut referrer,
            } => {
                let target_url = ids.next_full_url();
                if !referrer.link_to(&target_url) {
                    warn!(
                        referrer = referrer.resource_type(),
                        target = target.resource_type(),
                        "linked resource has no reference slot"
                    );
                }
                self.entries.push(BundleEntry::post(target_url, target));
                self.entries
                    .push(BundleEntry::post(ids.next_full_url(), referrer));
            }
        }
    }

    pub fn extend(&mut self, mapped: impl IntoIterator<Item = Mapped>, ids: &mut IdGenerator) {
        for item in mapped {
            self.push(item, ids);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Bundle {
        Bundle::transaction(self.entries)
    }
}

/// Maps an extract into bundle entries using shared lookups.
#[derive(Debug, Clone, Copy)]
pub struct BundleAssembler<'a> {
    registry: &'a MapperRegistry,
    codes: &'a CodeLookup,
    procedures: &'a ProcedureCodeTable,
}

impl<'a> BundleAssembler<'a> {
    pub fn new(
        registry: &'a MapperRegistry,
        codes: &'a CodeLookup,
        procedures: &'a ProcedureCodeTable,
    ) -> Self {
        Self {
            registry,
            codes,
            procedures,
        }
    }

    /// Builds the patient, domain and note entries for one extract.
    ///
    /// `file` names the input in errors.
    pub fn assemble(
        &self,
        extract: &ClinicalExtract,
        file: &str,
        ids: &mut IdGenerator,
    ) -> Result<BundleBuilder, AssembleError> {
        let Some(demographics) = extract.demographics.as_ref() else {
            return Err(AssembleError::MissingDemographics {
                file: file.to_string(),
            });
        };

        let subject = ids.patient_full_url(extract.patient_id.as_deref());
        let mut builder = BundleBuilder::new(map_patient(demographics), subject.clone());
        let context = MappingContext::new(&subject, self.codes, self.procedures);

        for domain in ClinicalDomain::ALL {
            let records = extract.collection(domain);
            if records.is_empty() {
                continue;
            }
            let before = builder.len();
            builder.extend(self.registry.map_records(domain, records, &context), ids);
            debug!(
                domain = %domain,
                records = records.len(),
                entries = builder.len() - before,
                "mapped domain"
            );
        }

        if !extract.notes.is_empty() {
            builder.extend(
                note_documents(&extract.notes, extract.mrn.as_deref(), &subject),
                ids,
            );
            debug!(notes = extract.notes.len(), "mapped notes");
        }

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdStrategy;
    use fhir_map::default_registry;
    use fhir_model::{Binary, DocumentReference};
    use serde_json::json;

    fn extract(value: serde_json::Value) -> ClinicalExtract {
        ClinicalExtract::from_value(&value).expect("valid extract")
    }

    fn assemble(value: serde_json::Value) -> Result<Bundle, AssembleError> {
        let codes = CodeLookup::parse("E119    Type 2 diabetes mellitus without complications\n");
        let procedures = ProcedureCodeTable::empty();
        let assembler = BundleAssembler::new(default_registry(), &codes, &procedures);
        let mut ids = IdGenerator::new(IdStrategy::Deterministic, "jane.json");
        assembler
            .assemble(&extract(value), "jane.json", &mut ids)
            .map(BundleBuilder::finish)
    }

    #[test]
    fn missing_demographics_is_an_error() {
        let error = assemble(json!({"diagnoses": []})).unwrap_err();
        assert!(matches!(
            error,
            AssembleError::MissingDemographics { ref file } if file == "jane.json"
        ));
    }

    #[test]
    fn demographics_only_gives_one_entry() {
        let bundle = assemble(json!({"demographics": [{"first_name": "Jane"}]})).unwrap();
        assert_eq!(bundle.len(), 1);
        assert!(bundle.patient_entry().is_some());
    }

    #[test]
    fn patient_id_uuid_becomes_subject() {
        let bundle = assemble(json!({
            "patient_tempus_id": "5d9a0c1e-2b7f-4f2e-8a61-0c3d2b1a9e77",
            "demographics": [{"first_name": "Jane"}],
            "vitals": [{"vitals_type_name": "Weight"}],
        }))
        .unwrap();
        let subject = "urn:uuid:5d9a0c1e-2b7f-4f2e-8a61-0c3d2b1a9e77";
        assert_eq!(bundle.entry[0].full_url, subject);
        assert_eq!(bundle.entry[1].resource.subject_reference(), Some(subject));
    }

    #[test]
    fn note_document_points_at_its_binary() {
        let bundle = assemble(json!({
            "mrn": "MRN1",
            "demographics": [{"first_name": "Jane"}],
            "notes": [{"name": "Progress Note", "notes": "ok"}],
        }))
        .unwrap();
        assert_eq!(bundle.len(), 3);
        let Resource::Binary(Binary { content_type, .. }) = &bundle.entry[1].resource else {
            panic!("binary precedes its document");
        };
        assert_eq!(content_type, "text/plain");
        let Resource::DocumentReference(DocumentReference { content, .. }) =
            &bundle.entry[2].resource
        else {
            panic!("document follows its binary");
        };
        assert_eq!(
            content[0].attachment.url.as_deref(),
            Some(bundle.entry[1].full_url.as_str())
        );
    }
}
