//! Input file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Lists files in `dir` whose extension matches one of `extensions`
/// (case-insensitive).
///
/// Returns files sorted by filename.
pub fn list_files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)));
        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Lists patient extract files (`*.json`).
pub fn list_extract_files(dir: &Path) -> Result<Vec<PathBuf>> {
    list_files_with_extensions(dir, &["json"])
}

/// Lists tab-separated source tables (`*.tsv`, `*.csv`).
pub fn list_tabular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    list_files_with_extensions(dir, &["tsv", "csv"])
}

/// File name without its extension, used to pair inputs with attachment
/// directories and output bundles.
pub fn input_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<attachments_root>/<input base name>`.
pub fn attachment_dir_for(attachments_root: &Path, input: &Path) -> PathBuf {
    attachments_root.join(input_base_name(input))
}

/// Replaces characters that are unsafe in file names with `_`.
pub fn file_safe_name(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn lists_only_matching_files_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.json", "a.JSON", "notes.txt", "c.tsv"] {
            fs::write(dir.path().join(name), "{}").expect("write");
        }
        fs::create_dir(dir.path().join("d.json")).expect("mkdir");

        let names: Vec<_> = list_extract_files(dir.path())
            .expect("list")
            .iter()
            .map(|p| input_base_name(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let tables = list_tabular_files(dir.path()).expect("list");
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = list_extract_files(Path::new("/definitely/not/here")).expect_err("missing");
        assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
    }

    #[test]
    fn attachment_dir_pairs_with_input_stem() {
        assert_eq!(
            attachment_dir_for(Path::new("/att"), Path::new("/in/p-7.json")),
            PathBuf::from("/att/p-7")
        );
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(file_safe_name(" 12/34 ab "), "12_34_ab");
        assert_eq!(file_safe_name("MRN-0001.v2"), "MRN-0001.v2");
    }
}
