//! Batch scheduler.
//!
//! A run moves through `Idle → LoadingCache → Batching → (Dispatching →
//! AwaitingBatch)* → Done`. Input files are split into batches of
//! `concurrency`; every file in a batch runs as its own task and reports one
//! [`FileOutcome`] over a bounded channel to a single writer task. The next
//! batch starts only after every task of the current one has finished.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fhir_codes::{CodeLookup, CodeSource, DEFAULT_CODES_MEMBER, ProcedureCodeTable};
use fhir_ingest::{attachment_dir_for, expand_demographics, list_extract_files};
use fhir_map::default_registry;
use fhir_output::write_bundle_for;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::attachments::{AttachmentReport, FailedAttachment};
use crate::error::{Result, SchedulerError, WorkerError};
use crate::worker::{
    BundledFile, FileOutcome, WorkerContext, WorkerOptions, file_label, process_file,
};

/// Default number of files processed at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Which inputs a run processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every extract in the input directory.
    #[default]
    Files,
    /// Only patients with an attachment directory, after expanding the
    /// consolidated demographics file if one is configured.
    Attachments,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Files => "files",
            Self::Attachments => "attachments",
        })
    }
}

/// Scheduler lifecycle, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    LoadingCache,
    Batching,
    Dispatching { batch: usize },
    AwaitingBatch { batch: usize },
    Done,
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mode: RunMode,
    pub concurrency: usize,
    /// Per-file limit; an expired file is reported as failed.
    pub unit_timeout: Option<Duration>,
    /// Consolidated demographics file expanded into the input directory
    /// before discovery.
    pub demographics_file: Option<PathBuf>,
    /// `None` runs without code descriptions.
    pub codes: Option<CodeSource>,
    pub codes_member: String,
    pub procedure_codes: Option<PathBuf>,
    pub worker: WorkerOptions,
}

impl SchedulerConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            mode: RunMode::default(),
            concurrency: DEFAULT_CONCURRENCY,
            unit_timeout: None,
            demographics_file: None,
            codes: Some(CodeSource::default()),
            codes_member: DEFAULT_CODES_MEMBER.to_string(),
            procedure_codes: None,
            worker: WorkerOptions::default(),
        }
    }
}

/// Progress hooks, called from the writer task.
pub trait RunObserver: Send + Sync {
    fn files_discovered(&self, _total: usize) {}

    fn file_finished(&self, _result: &FileResult) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Written {
        output: PathBuf,
        entries: usize,
        bytes: u64,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
    pub attachments: AttachmentReport,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Written { .. })
    }
}

/// Results of a whole run, ordered by file name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub codes_loaded: usize,
    pub duration_ms: u64,
    pub files: Vec<FileResult>,
}

impl RunSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|result| result.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|result| !result.is_success())
    }

    /// Failed attachments with the input file they belong to.
    pub fn failed_attachments(&self) -> impl Iterator<Item = (&str, &FailedAttachment)> {
        self.files.iter().flat_map(|result| {
            result
                .attachments
                .failed
                .iter()
                .map(move |failed| (result.file.as_str(), failed))
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    history: Vec<SchedulerState>,
    observer: Arc<dyn RunObserver>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            history: vec![SchedulerState::Idle],
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[SchedulerState] {
        &self.history
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!(from = ?self.state, to = ?next, "scheduler state");
        self.state = next;
        self.history.push(next);
    }

    /// Runs every batch to completion.
    ///
    /// Only configuration and discovery problems fail the run; per-file
    /// problems are reported in the summary.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let span = info_span!(
            "run",
            mode = %self.config.mode,
            input = %self.config.input_dir.display()
        );
        self.run_batches().instrument(span).await
    }

    async fn run_batches(&mut self) -> Result<RunSummary> {
        let started = Instant::now();
        if self.config.concurrency == 0 {
            return Err(SchedulerError::ZeroConcurrency);
        }
        if self.config.mode == RunMode::Attachments && self.config.worker.attachments_dir.is_none()
        {
            return Err(SchedulerError::MissingAttachmentsDir);
        }

        self.transition(SchedulerState::LoadingCache);
        let codes = match &self.config.codes {
            Some(source) => fhir_codes::load(source, &self.config.codes_member).await,
            None => {
                info!("code descriptions disabled");
                CodeLookup::empty()
            }
        };
        let codes_loaded = codes.len();
        let procedures = load_procedures(self.config.procedure_codes.as_deref());

        self.transition(SchedulerState::Batching);
        let files = self.discover().await?;
        let output_dir = self.config.output_dir.clone();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| SchedulerError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;
        self.observer.files_discovered(files.len());

        let concurrency = self.config.concurrency;
        let timeout = self.config.unit_timeout;
        let context = Arc::new(WorkerContext {
            codes: Arc::new(codes),
            procedures: Arc::new(procedures),
            registry: default_registry(),
            options: self.config.worker.clone(),
        });

        let (sender, receiver) = mpsc::channel(concurrency);
        let writer = tokio::spawn(
            write_outcomes(receiver, output_dir, Arc::clone(&self.observer)).in_current_span(),
        );

        let batch_count = files.len().div_ceil(concurrency);
        info!(files = files.len(), batches = batch_count, concurrency, "dispatching");
        for (index, batch) in files.chunks(concurrency).enumerate() {
            let number = index + 1;
            let span = info_span!("batch", batch = number, files = batch.len());

            self.transition(SchedulerState::Dispatching { batch: number });
            let mut units = JoinSet::new();
            for path in batch {
                units.spawn(
                    run_unit(path.clone(), Arc::clone(&context), timeout, sender.clone())
                        .instrument(span.clone()),
                );
            }

            self.transition(SchedulerState::AwaitingBatch { batch: number });
            while let Some(joined) = units.join_next().await {
                if let Err(join_error) = joined {
                    span.in_scope(|| error!(error = %join_error, "unit task failed"));
                }
            }
        }
        drop(sender);

        let mut results = writer
            .await
            .map_err(|e| SchedulerError::Task(e.to_string()))?;
        results.sort_by(|a, b| a.file.cmp(&b.file));
        self.transition(SchedulerState::Done);

        let summary = RunSummary {
            mode: self.config.mode,
            codes_loaded,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            files: results,
        };
        info!(
            succeeded = summary.succeeded().count(),
            failed = summary.failed().count(),
            duration_ms = summary.duration_ms,
            "run complete"
        );
        Ok(summary)
    }

    /// Expands consolidated demographics when configured, then lists the
    /// extracts this run covers.
    async fn discover(&self) -> Result<Vec<PathBuf>> {
        if let Some(source) = self.config.demographics_file.clone() {
            let input_dir = self.config.input_dir.clone();
            tokio::task::spawn_blocking(move || expand_demographics(&source, &input_dir))
                .await
                .map_err(|e| SchedulerError::Task(e.to_string()))??;
        }

        let mut files = list_extract_files(&self.config.input_dir)?;
        if self.config.mode == RunMode::Attachments
            && let Some(root) = &self.config.worker.attachments_dir
        {
            let before = files.len();
            files.retain(|path| attachment_dir_for(root, path).is_dir());
            info!(
                with_attachments = files.len(),
                without_attachments = before - files.len(),
                "selected patients with attachment directories"
            );
        }
        Ok(files)
    }
}

fn load_procedures(path: Option<&Path>) -> ProcedureCodeTable {
    let Some(path) = path else {
        return ProcedureCodeTable::empty();
    };
    match ProcedureCodeTable::from_path(path) {
        Ok(table) => {
            info!(path = %path.display(), codes = table.len(), "loaded procedure codes");
            table
        }
        Err(error) => {
            warn!(
                path = %path.display(),
                error = %error,
                "procedure code table unavailable; continuing without it"
            );
            ProcedureCodeTable::empty()
        }
    }
}

/// Runs one file in its own task so a panic or timeout fails only that file.
async fn run_unit(
    path: PathBuf,
    context: Arc<WorkerContext>,
    timeout: Option<Duration>,
    sender: mpsc::Sender<FileOutcome>,
) {
    let file = file_label(&path);
    let mut handle = tokio::spawn(process_file(path, context).in_current_span());
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                Ok(FileOutcome::Failed {
                    file: file.clone(),
                    error: WorkerError::Timeout {
                        seconds: limit.as_secs(),
                    },
                })
            }
        },
        None => handle.await,
    };
    let outcome = joined.unwrap_or_else(|join_error| FileOutcome::Failed {
        file: file.clone(),
        error: WorkerError::Task(join_error.to_string()),
    });
    if sender.send(outcome).await.is_err() {
        error!(file = %file, "writer stopped; result dropped");
    }
}

/// Drains the result channel, writing each bundle as it arrives.
async fn write_outcomes(
    mut receiver: mpsc::Receiver<FileOutcome>,
    output_dir: PathBuf,
    observer: Arc<dyn RunObserver>,
) -> Vec<FileResult> {
    let mut results = Vec::new();
    while let Some(outcome) = receiver.recv().await {
        let result = match outcome {
            FileOutcome::Bundled(bundled) => write_bundled(*bundled, &output_dir).await,
            FileOutcome::Failed { file, error } => {
                error!(file = %file, error = %error, "file failed");
                FileResult {
                    file,
                    status: FileStatus::Failed {
                        error: error.to_string(),
                    },
                    attachments: AttachmentReport::default(),
                }
            }
        };
        observer.file_finished(&result);
        results.push(result);
    }
    results
}

async fn write_bundled(bundled: BundledFile, output_dir: &Path) -> FileResult {
    let BundledFile {
        file,
        input,
        bundle,
        attachments,
    } = bundled;
    let entries = bundle.len();
    let span = info_span!("write", file = %file);

    let dir = output_dir.to_path_buf();
    let write_span = span.clone();
    let written = tokio::task::spawn_blocking(move || {
        write_span.in_scope(|| write_bundle_for(&dir, &input, &bundle))
    })
    .await;

    let status = match written {
        Ok(Ok(written)) => {
            span.in_scope(|| {
                info!(
                    output = %written.path.display(),
                    entries,
                    bytes = written.bytes,
                    "wrote bundle"
                );
            });
            FileStatus::Written {
                output: written.path,
                entries,
                bytes: written.bytes,
            }
        }
        Ok(Err(output_error)) => {
            let error = WorkerError::from(output_error);
            span.in_scope(|| error!(error = %error, "bundle write failed"));
            FileStatus::Failed {
                error: error.to_string(),
            }
        }
        Err(join_error) => {
            let error = WorkerError::Task(join_error.to_string());
            span.in_scope(|| error!(error = %error, "bundle write failed"));
            FileStatus::Failed {
                error: error.to_string(),
            }
        }
    };
    FileResult {
        file,
        status,
        attachments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let mut config = SchedulerConfig::new("in", "out");
        config.concurrency = 0;
        let mut scheduler = Scheduler::new(config);
        assert!(matches!(
            scheduler.run().await,
            Err(SchedulerError::ZeroConcurrency)
        ));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn attachments_mode_needs_a_directory() {
        let mut config = SchedulerConfig::new("in", "out");
        config.mode = RunMode::Attachments;
        let mut scheduler = Scheduler::new(config);
        assert!(matches!(
            scheduler.run().await,
            Err(SchedulerError::MissingAttachmentsDir)
        ));
    }

    #[test]
    fn summary_counts() {
        let summary = RunSummary {
            files: vec![
                FileResult {
                    file: "a.json".to_string(),
                    status: FileStatus::Written {
                        output: PathBuf::from("out/a-bundle.json"),
                        entries: 3,
                        bytes: 120,
                    },
                    attachments: AttachmentReport {
                        attached: 1,
                        failed: vec![FailedAttachment {
                            file: "x.pdf".to_string(),
                            reason: "denied".to_string(),
                        }],
                    },
                },
                FileResult {
                    file: "b.json".to_string(),
                    status: FileStatus::Failed {
                        error: "bad".to_string(),
                    },
                    attachments: AttachmentReport::default(),
                },
            ],
            ..RunSummary::default()
        };
        assert_eq!(summary.succeeded().count(), 1);
        assert_eq!(summary.failed().count(), 1);
        assert!(summary.has_failures());
        let failed: Vec<_> = summary.failed_attachments().collect();
        assert_eq!(failed[0].0, "a.json");
        assert_eq!(failed[0].1.file, "x.pdf");
    }
}
