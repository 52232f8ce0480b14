//! Attachment files to DocumentReference + Binary pairs.
//!
//! Each patient may have a directory of files named
//! `<id>_<category>_..._<date>.<ext>`. Every token is optional; a missing
//! token leaves the matching field absent.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use fhir_map::Mapped;
use fhir_model::{NOT_AVAILABLE, normalize_timestamp};
use regex::Regex;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::documents::{DocumentSource, document_pair};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-?\d{2}-?\d{2}$").expect("valid regex"));

/// Fields recovered from an attachment's file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentName {
    pub identifier: Option<String>,
    pub category: Option<String>,
    /// Normalized timestamp of the first valid date token.
    pub date: Option<String>,
}

/// Parses `<id>_<category>_..._<date>` from a file name.
pub fn parse_attachment_name(file_name: &str) -> AttachmentName {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let tokens: Vec<&str> = stem.split('_').map(str::trim).collect();
    let token = |index: usize| {
        tokens
            .get(index)
            .filter(|t| !t.is_empty())
            .map(|t| (*t).to_string())
    };

    AttachmentName {
        identifier: token(0),
        category: token(1).map(|category| category.replace('-', " ")),
        date: tokens.iter().find_map(|t| date_token(t)),
    }
}

fn date_token(token: &str) -> Option<String> {
    if !DATE_TOKEN.is_match(token) {
        return None;
    }
    normalize_timestamp(&token.replace('-', ""))
}

/// Content type for a file, guessed from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// An attachment that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAttachment {
    pub file: String,
    pub reason: String,
}

/// Outcome of ingesting one patient's attachment directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentReport {
    pub attached: usize,
    pub failed: Vec<FailedAttachment>,
}

/// Reads every file in `dir` concurrently and returns their document pairs
/// in file-name order.
///
/// A missing directory yields nothing. Unreadable files are reported, not
/// raised.
pub async fn ingest_attachments(dir: &Path, subject: &str) -> (Vec<Mapped>, AttachmentReport) {
    let files = match list_files(dir).await {
        Ok(files) => files,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "no attachment directory");
            return (Vec::new(), AttachmentReport::default());
        }
        Err(error) => {
            warn!(dir = %dir.display(), error = %error, "attachment directory unreadable");
            let report = AttachmentReport {
                attached: 0,
                failed: vec![FailedAttachment {
                    file: dir.display().to_string(),
                    reason: error.to_string(),
                }],
            };
            return (Vec::new(), report);
        }
    };

    let (pairs, report) = ingest_attachment_files(&files, subject).await;
    debug!(
        dir = %dir.display(),
        attached = report.attached,
        failed = report.failed.len(),
        "attachments ingested"
    );
    (pairs, report)
}

/// Reads `files` concurrently, one task per file, keeping their order.
///
/// A file that cannot be read lands in [`AttachmentReport::failed`]; the
/// others are still attached.
pub async fn ingest_attachment_files(
    files: &[PathBuf],
    subject: &str,
) -> (Vec<Mapped>, AttachmentReport) {
    let mut tasks = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        let subject = subject.to_string();
        tasks.spawn(async move { (index, read_attachment(&path, &subject).await) });
    }

    let mut results: Vec<Option<Result<Mapped, String>>> = vec![None; files.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(error) => warn!(error = %error, "attachment task failed"),
        }
    }

    let mut report = AttachmentReport::default();
    let mut pairs = Vec::new();
    for (path, result) in files.iter().zip(results) {
        let file = display_name(path);
        match result {
            Some(Ok(pair)) => {
                report.attached += 1;
                pairs.push(pair);
            }
            Some(Err(reason)) => {
                warn!(file = %file, reason = %reason, "attachment skipped");
                report.failed.push(FailedAttachment { file, reason });
            }
            None => report.failed.push(FailedAttachment {
                file,
                reason: "attachment task did not complete".to_string(),
            }),
        }
    }
    (pairs, report)
}

async fn read_attachment(path: &Path, subject: &str) -> Result<Mapped, String> {
    let payload = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
    let name = parse_attachment_name(&display_name(path));
    Ok(document_pair(
        subject,
        DocumentSource {
            identifier: name
                .identifier
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            category: name.category,
            date: name.date,
            content_type: content_type_for(path).to_string(),
            payload,
        },
    ))
}

/// Regular files directly inside `dir`, sorted by name.
async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by_key(|path| path.file_name().map(ToOwned::to_owned));
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_name() {
        let name = parse_attachment_name("D123_Pathology-report_20230501.pdf");
        assert_eq!(name.identifier.as_deref(), Some("D123"));
        assert_eq!(name.category.as_deref(), Some("Pathology report"));
        assert_eq!(name.date.as_deref(), Some("2023-05-01T00:00:00.000Z"));
    }

    #[test]
    fn date_token_anywhere_and_hyphenated() {
        let name = parse_attachment_name("D9_Scan_extra_2021-12-31_v2.png");
        assert_eq!(name.date.as_deref(), Some("2021-12-31T00:00:00.000Z"));
    }

    #[test]
    fn invalid_calendar_dates_are_ignored() {
        assert!(parse_attachment_name("D1_Scan_20231345.pdf").date.is_none());
        assert!(parse_attachment_name("D1_Scan_2023-02-30.pdf").date.is_none());
    }

    #[test]
    fn missing_tokens_are_absent() {
        let name = parse_attachment_name("scan.pdf");
        assert_eq!(name.identifier.as_deref(), Some("scan"));
        assert!(name.category.is_none());
        assert!(name.date.is_none());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("a.txt")), "text/plain");
        assert_eq!(content_type_for(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.bin")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("README")), DEFAULT_CONTENT_TYPE);
    }
}
