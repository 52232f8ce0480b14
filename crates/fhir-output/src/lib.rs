//! Streaming JSON output.
//!
//! Bundles can hold thousands of entries with base64 payloads, so they are
//! written through [`StreamingJsonWriter`] rather than rendered to one
//! string. The same writer serves every JSON document the tool produces.

pub mod error;
pub mod files;
pub mod writer;

pub use error::{OutputError, Result};
pub use files::{WrittenFile, bundle_file_name, write_bundle_for, write_json_file, write_with};
pub use writer::{StreamingJsonWriter, UNSERIALIZABLE};
