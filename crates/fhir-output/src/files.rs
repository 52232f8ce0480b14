//! File-level helpers around [`StreamingJsonWriter`].

use std::fs::File;
use std::path::{Path, PathBuf};

use fhir_model::Bundle;
use serde::Serialize;
use tracing::debug;

use crate::error::{OutputError, Result};
use crate::writer::StreamingJsonWriter;

const BUNDLE_SUFFIX: &str = "-bundle.json";

/// What was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// `<input base name>-bundle.json` for an input extract path.
pub fn bundle_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("patient");
    format!("{stem}{BUNDLE_SUFFIX}")
}

/// Streams a bundle to `<output_dir>/<input base name>-bundle.json`.
pub fn write_bundle_for(output_dir: &Path, input: &Path, bundle: &Bundle) -> Result<WrittenFile> {
    let path = output_dir.join(bundle_file_name(input));
    write_with(&path, |writer| writer.write_bundle(bundle))
}

/// Streams any serializable document to `path`.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<WrittenFile> {
    write_with(path, |writer| writer.write_serialize(document))
}

/// Creates `path`, runs `write` against a streaming writer over it and
/// flushes. A failure after creation leaves a partial file behind.
pub fn write_with<F>(path: &Path, write: F) -> Result<WrittenFile>
where
    F: FnOnce(&mut StreamingJsonWriter<File>) -> Result<()>,
{
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = StreamingJsonWriter::new(file);
    let written = write(&mut writer).and_then(|()| {
        let bytes = writer.bytes_written();
        let file = writer.finish()?;
        file.sync_data()?;
        Ok(bytes)
    });
    let bytes = written.map_err(|err| match err {
        OutputError::Io(source) => OutputError::Write {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    debug!(path = %path.display(), bytes, "wrote JSON document");
    Ok(WrittenFile {
        path: path.to_path_buf(),
        bytes,
    })
}
