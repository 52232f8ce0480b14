//! Loading the diagnosis code list from a remote archive or a local file.

use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CodesError, Result};
use crate::lookup::CodeLookup;

/// Published bulk archive of diagnosis code descriptions.
pub const DEFAULT_CODES_URL: &str =
    "https://www.cms.gov/files/zip/2026-code-descriptions-tabular-order.zip";

/// Archive member holding the two-column code list.
pub const DEFAULT_CODES_MEMBER: &str = "icd10cm_codes_2026.txt";

const USER_AGENT_VALUE: &str = concat!("fhir-bundler/", env!("CARGO_PKG_VERSION"));

/// Where the code list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// An `http(s)` URL to a zip archive.
    Url(String),
    /// A local zip archive.
    Archive(PathBuf),
    /// A local plain-text code list.
    Text(PathBuf),
}

impl CodeSource {
    /// Classifies a configured source string.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(value.to_string())
        } else if lower.ends_with(".zip") {
            Self::Archive(PathBuf::from(value))
        } else {
            Self::Text(PathBuf::from(value))
        }
    }
}

impl Default for CodeSource {
    fn default() -> Self {
        Self::Url(DEFAULT_CODES_URL.to_string())
    }
}

impl fmt::Display for CodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Archive(path) | Self::Text(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads the code lookup, degrading to an empty lookup on any failure.
///
/// The run continues without descriptions; mappers fall back to the
/// record's own names.
pub async fn load(source: &CodeSource, member: &str) -> CodeLookup {
    match try_load(source, member).await {
        Ok(lookup) if lookup.is_empty() => {
            warn!(source = %source, "code list is empty; descriptions will fall back to source names");
            lookup
        }
        Ok(lookup) => {
            info!(source = %source, codes = lookup.len(), "loaded code descriptions");
            lookup
        }
        Err(error) => {
            warn!(source = %source, error = %error, "code list unavailable; continuing without descriptions");
            CodeLookup::empty()
        }
    }
}

/// Loads the code lookup, reporting failures.
pub async fn try_load(source: &CodeSource, member: &str) -> Result<CodeLookup> {
    let text = match source {
        CodeSource::Url(url) => {
            let bytes = download(url).await?;
            let member = member.to_string();
            tokio::task::spawn_blocking(move || read_member(&bytes, &member))
                .await
                .map_err(|e| CodesError::Task(e.to_string()))??
        }
        CodeSource::Archive(path) => {
            let bytes = read_file(path).await?;
            let member = member.to_string();
            tokio::task::spawn_blocking(move || read_member(&bytes, &member))
                .await
                .map_err(|e| CodesError::Task(e.to_string()))??
        }
        CodeSource::Text(path) => String::from_utf8_lossy(&read_file(path).await?).into_owned(),
    };
    Ok(CodeLookup::parse(&text))
}

async fn download(url: &str) -> Result<Vec<u8>> {
    debug!(url, "downloading code archive");
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(CodesError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| CodesError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Extracts a text member from zip archive bytes.
///
/// The member matches by exact name or by final path component, so archives
/// that nest the list in a folder still resolve.
pub fn read_member(archive: &[u8], member: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive))?;
    let name = archive
        .file_names()
        .find(|name| {
            *name == member
                || Path::new(name)
                    .file_name()
                    .is_some_and(|file_name| file_name == member)
        })
        .map(str::to_string)
        .ok_or_else(|| CodesError::MemberNotFound {
            member: member.to_string(),
        })?;

    let mut file = archive.by_name(&name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| CodesError::Archive(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn archive_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).expect("start zip entry");
                writer.write_all(content.as_bytes()).expect("write zip entry");
            }
            writer.finish().expect("finish zip");
        }
        buffer.into_inner()
    }

    #[test]
    fn classifies_sources() {
        assert_eq!(
            CodeSource::parse("https://example.org/codes.zip"),
            CodeSource::Url("https://example.org/codes.zip".to_string())
        );
        assert_eq!(
            CodeSource::parse("data/codes.ZIP"),
            CodeSource::Archive(PathBuf::from("data/codes.ZIP"))
        );
        assert_eq!(
            CodeSource::parse("codes.txt"),
            CodeSource::Text(PathBuf::from("codes.txt"))
        );
        assert_eq!(CodeSource::default().to_string(), DEFAULT_CODES_URL);
    }

    #[test]
    fn reads_member_by_file_name() {
        let bytes = archive_with(&[
            ("readme.txt", "ignore me"),
            ("tabular/icd10cm_codes_2026.txt", "E119    Type 2 diabetes\n"),
        ]);
        let text = read_member(&bytes, DEFAULT_CODES_MEMBER).expect("read member");
        assert!(text.starts_with("E119"));
    }

    #[test]
    fn missing_member_is_reported() {
        let bytes = archive_with(&[("other.txt", "x")]);
        let err = read_member(&bytes, DEFAULT_CODES_MEMBER).unwrap_err();
        assert!(matches!(err, CodesError::MemberNotFound { .. }));
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = read_member(b"definitely not a zip", DEFAULT_CODES_MEMBER).unwrap_err();
        assert!(matches!(err, CodesError::Archive(_)));
    }

    #[tokio::test]
    async fn local_archive_loads() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("codes.zip");
        std::fs::write(
            &path,
            archive_with(&[(DEFAULT_CODES_MEMBER, "I10     Essential hypertension\n")]),
        )
        .expect("write archive");

        let lookup = load(&CodeSource::Archive(path), DEFAULT_CODES_MEMBER).await;
        assert_eq!(lookup.get("I10"), Some("Essential hypertension"));
    }

    #[tokio::test]
    async fn unreadable_source_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = CodeSource::Text(dir.path().join("missing.txt"));
        assert!(try_load(&source, DEFAULT_CODES_MEMBER).await.is_err());
        assert!(load(&source, DEFAULT_CODES_MEMBER).await.is_empty());
    }
}
