//! Processing of one input file into a bundle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fhir_codes::{CodeLookup, ProcedureCodeTable};
use fhir_ingest::attachment_dir_for;
use fhir_map::MapperRegistry;
use fhir_model::{Bundle, ClinicalExtract};
use tracing::{Instrument, debug, info_span, warn};

use crate::assembler::BundleAssembler;
use crate::attachments::{AttachmentReport, ingest_attachments};
use crate::error::WorkerError;
use crate::ids::{IdGenerator, IdStrategy};

/// Per-run options every unit sees.
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Root holding one attachment directory per input base name.
    pub attachments_dir: Option<PathBuf>,
    pub id_strategy: IdStrategy,
}

/// Immutable state shared by every unit of a run.
#[derive(Debug)]
pub struct WorkerContext {
    pub codes: Arc<CodeLookup>,
    pub procedures: Arc<ProcedureCodeTable>,
    pub registry: &'static MapperRegistry,
    pub options: WorkerOptions,
}

/// A bundle ready for the writer.
#[derive(Debug)]
pub struct BundledFile {
    pub file: String,
    pub input: PathBuf,
    pub bundle: Bundle,
    pub attachments: AttachmentReport,
}

/// The single result each unit reports.
#[derive(Debug)]
pub enum FileOutcome {
    Bundled(Box<BundledFile>),
    Failed { file: String, error: WorkerError },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            Self::Bundled(bundled) => &bundled.file,
            Self::Failed { file, .. } => file,
        }
    }
}

/// Reads, maps and assembles one extract, then appends its attachments.
pub async fn process_file(path: PathBuf, context: Arc<WorkerContext>) -> FileOutcome {
    let file = file_label(&path);
    let span = info_span!("process_file", file = %file);
    match build_bundle(&path, &file, &context).instrument(span).await {
        Ok(bundled) => FileOutcome::Bundled(Box::new(bundled)),
        Err(error) => FileOutcome::Failed { file, error },
    }
}

async fn build_bundle(
    path: &Path,
    file: &str,
    context: &WorkerContext,
) -> Result<BundledFile, WorkerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| WorkerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let extract = ClinicalExtract::from_slice(&bytes)?;
    if extract.skipped_records > 0 {
        warn!(
            skipped = extract.skipped_records,
            "unreadable records and untyped notes were skipped"
        );
    }

    let mut ids = IdGenerator::new(context.options.id_strategy, file);
    let assembler = BundleAssembler::new(context.registry, &context.codes, &context.procedures);
    let mut builder = assembler.assemble(&extract, file, &mut ids)?;

    let attachments = match &context.options.attachments_dir {
        Some(root) => {
            let dir = attachment_dir_for(root, path);
            let span = info_span!("attachments", dir = %dir.display());
            let (pairs, report) = ingest_attachments(&dir, builder.subject())
                .instrument(span)
                .await;
            builder.extend(pairs, &mut ids);
            report
        }
        None => AttachmentReport::default(),
    };

    debug!(
        records = extract.record_count(),
        entries = builder.len(),
        "assembled bundle"
    );
    Ok(BundledFile {
        file: file.to_string(),
        input: path.to_path_buf(),
        bundle: builder.finish(),
        attachments,
    })
}

/// File name used in logs, errors and the summary.
pub fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
