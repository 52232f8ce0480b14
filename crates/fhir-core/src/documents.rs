//! DocumentReference + Binary pairs shared by notes and attachments.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fhir_map::Mapped;
use fhir_model::{
    Attachment, Binary, CodeableConcept, DocumentContent, DocumentReference, Identifier,
    Reference, Resource,
};

const URI_SYSTEM: &str = "urn:ietf:rfc:3986";

/// Everything needed to describe one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    pub identifier: String,
    /// Note type or attachment category.
    pub category: Option<String>,
    /// Normalized timestamp.
    pub date: Option<String>,
    pub content_type: String,
    pub payload: Vec<u8>,
}

/// Builds the linked pair; the assembler points the document's attachment
/// at the Binary entry.
pub fn document_pair(subject: &str, source: DocumentSource) -> Mapped {
    let DocumentSource {
        identifier,
        category,
        date,
        content_type,
        payload,
    } = source;

    let document = DocumentReference {
        identifier: vec![Identifier::new(Some(URI_SYSTEM.to_string()), identifier)],
        status: "current".to_string(),
        category: category
            .iter()
            .map(|text| CodeableConcept {
                coding: Vec::new(),
                text: Some(text.clone()),
            })
            .collect(),
        subject: Reference::to(subject),
        date: date.clone(),
        content: vec![DocumentContent {
            attachment: Attachment {
                content_type: Some(content_type.clone()),
                url: None,
                title: category,
                creation: date,
            },
        }],
    };
    let binary = Binary {
        content_type,
        data: STANDARD.encode(payload),
    };

    Mapped::Linked {
        target: Resource::Binary(binary),
        referrer: Resource::DocumentReference(document),
    }
}
