use serde::{Deserialize, Serialize};

use crate::resources::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Transaction,
}

/// The `request` member of a transaction entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub request: BundleRequest,
    pub resource: Resource,
}

impl BundleEntry {
    /// A `POST` entry whose request URL is the resource type.
    pub fn post(full_url: impl Into<String>, resource: Resource) -> Self {
        Self {
            full_url: full_url.into(),
            request: BundleRequest {
                method: "POST".to_string(),
                url: resource.resource_type().to_string(),
            },
            resource,
        }
    }
}

/// A FHIR transaction bundle for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: BundleType,
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn transaction(entry: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: BundleType::Transaction,
            entry,
        }
    }

    /// The Patient entry, which is always first.
    pub fn patient_entry(&self) -> Option<&BundleEntry> {
        self.entry
            .first()
            .filter(|entry| matches!(entry.resource, Resource::Patient(_)))
    }

    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}
