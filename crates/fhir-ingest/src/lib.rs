//! Input discovery and preparation.
//!
//! - [`list_extract_files`]: the per-patient `*.json` extracts to bundle.
//! - [`expand_demographics`]: splits a consolidated demographics file into
//!   one extract per patient.
//! - [`group_folder`]: turns flat tab-separated tables into per-patient
//!   extracts keyed by MRN.

mod demographics;
mod discovery;
mod error;
mod tabular;

// === Error Types ===
pub use error::{IngestError, Result};

// === File Discovery ===
pub use discovery::{
    attachment_dir_for, file_safe_name, input_base_name, list_extract_files,
    list_files_with_extensions, list_tabular_files,
};

// === Consolidated Demographics ===
pub use demographics::{DemographicsExpansion, expand_demographics};

// === Tabular Grouping ===
pub use tabular::{
    GroupingReport, TabularFile, aggregate_notes, group_by_mrn, group_folder, read_tabular_file,
};
