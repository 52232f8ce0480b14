//! Bundle assembly and the concurrent run over a directory of extracts.
//!
//! - [`BundleAssembler`]: one extract to one transaction bundle.
//! - [`ingest_attachments`]: a patient's attachment files to document pairs.
//! - [`Scheduler`]: batches input files over tokio tasks and streams the
//!   finished bundles to disk.

pub mod assembler;
pub mod attachments;
pub mod documents;
pub mod error;
pub mod ids;
pub mod notes;
pub mod scheduler;
pub mod worker;

// === Error Types ===
pub use error::{AssembleError, Result, SchedulerError, WorkerError};

// === Assembly ===
pub use assembler::{BundleAssembler, BundleBuilder};
pub use documents::{DocumentSource, document_pair};
pub use ids::{IdGenerator, IdStrategy, full_url, note_identifier};
pub use notes::note_documents;

// === Attachments ===
pub use attachments::{
    AttachmentName, AttachmentReport, FailedAttachment, content_type_for,
    ingest_attachment_files, ingest_attachments, parse_attachment_name,
};

// === Scheduling ===
pub use scheduler::{
    DEFAULT_CONCURRENCY, FileResult, FileStatus, NoopObserver, RunMode, RunObserver, RunSummary,
    Scheduler, SchedulerConfig, SchedulerState,
};
pub use worker::{BundledFile, FileOutcome, WorkerContext, WorkerOptions, process_file};
