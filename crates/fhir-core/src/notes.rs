//! Pre-aggregated clinical notes to documents.

use fhir_map::Mapped;
use fhir_model::{NOT_AVAILABLE, NoteRecord, normalize_timestamp};

use crate::documents::{DocumentSource, document_pair};
use crate::ids::note_identifier;

const NOTE_CONTENT_TYPE: &str = "text/plain";

/// One plain-text document per note type.
///
/// `mrn` is the extract-level MRN, used when a note carries none.
pub fn note_documents(notes: &[NoteRecord], mrn: Option<&str>, subject: &str) -> Vec<Mapped> {
    notes
        .iter()
        .map(|note| {
            let owner = note.mrn.as_deref().or(mrn).unwrap_or(NOT_AVAILABLE);
            document_pair(
                subject,
                DocumentSource {
                    identifier: note_identifier(owner, &note.name).to_string(),
                    category: Some(note.name.clone()),
                    date: note.date_time.as_deref().and_then(normalize_timestamp),
                    content_type: NOTE_CONTENT_TYPE.to_string(),
                    payload: note.notes.as_bytes().to_vec(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir_model::Resource;

    fn note(mrn: Option<&str>, date_time: Option<&str>) -> NoteRecord {
        NoteRecord {
            mrn: mrn.map(str::to_string),
            name: "Progress Note".to_string(),
            date_time: date_time.map(str::to_string),
            notes: "line one\nline two".to_string(),
        }
    }

    fn document(mapped: &Mapped) -> (&fhir_model::Binary, &fhir_model::DocumentReference) {
        match mapped {
            Mapped::Linked {
                target: Resource::Binary(binary),
                referrer: Resource::DocumentReference(document),
            } => (binary, document),
            other => panic!("unexpected note output: {other:?}"),
        }
    }

    #[test]
    fn note_becomes_text_document() {
        let mapped = note_documents(
            &[note(Some("MRN7"), Some("2023-02-03 10:00:00"))],
            None,
            "urn:uuid:p",
        );
        let (binary, document) = document(&mapped[0]);
        assert_eq!(binary.content_type, "text/plain");
        assert_eq!(binary.data, "bGluZSBvbmUKbGluZSB0d28=");
        assert_eq!(document.category[0].text.as_deref(), Some("Progress Note"));
        assert_eq!(document.date.as_deref(), Some("2023-02-03T10:00:00.000Z"));
        assert_eq!(
            document.identifier[0].value,
            Some(note_identifier("MRN7", "Progress Note").to_string())
        );
    }

    #[test]
    fn extract_mrn_backs_up_the_note_and_bad_dates_drop() {
        let mapped = note_documents(&[note(None, Some("yesterday"))], Some("MRN9"), "urn:uuid:p");
        let (_, document) = document(&mapped[0]);
        assert!(document.date.is_none());
        assert_eq!(
            document.identifier[0].value,
            Some(note_identifier("MRN9", "Progress Note").to_string())
        );
    }
}
