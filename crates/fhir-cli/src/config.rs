//! Run configuration: CLI flags over the TOML file over defaults.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fhir_codes::{CodeSource, DEFAULT_CODES_MEMBER};
use fhir_core::{DEFAULT_CONCURRENCY, IdStrategy, RunMode, SchedulerConfig, WorkerOptions};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::RunArgs;

pub const DEFAULT_INPUT_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// `codes_source` value that disables code descriptions.
const NO_CODES: &str = "none";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings accepted in the TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub attachments_dir: Option<PathBuf>,
    pub mode: Option<RunMode>,
    pub concurrency: Option<usize>,
    pub unit_timeout_secs: Option<u64>,
    pub demographics_file: Option<PathBuf>,
    /// URL, zip archive or text file; `"none"` disables descriptions.
    pub codes_source: Option<String>,
    pub codes_member: Option<String>,
    pub procedure_codes_file: Option<PathBuf>,
    pub id_strategy: Option<IdStrategy>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads the config file named by `--config`, if any, and merges the flags
/// over it.
pub fn resolve(args: &RunArgs) -> Result<SchedulerConfig, ConfigError> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    Ok(merge(args, file))
}

pub fn merge(args: &RunArgs, file: FileConfig) -> SchedulerConfig {
    let input_dir = args
        .input_dir
        .clone()
        .or(file.input_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let output_dir = args
        .output_dir
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let mut config = SchedulerConfig::new(input_dir, output_dir);
    config.mode = args.mode.map(RunMode::from).or(file.mode).unwrap_or_default();
    config.concurrency = args
        .concurrency
        .or(file.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    config.unit_timeout = args
        .timeout
        .or(file.unit_timeout_secs)
        .map(Duration::from_secs);
    config.demographics_file = args.demographics.clone().or(file.demographics_file);
    config.codes = if args.no_codes {
        None
    } else {
        match args.codes.as_deref().or(file.codes_source.as_deref()) {
            Some(value) => code_source(value),
            None => Some(CodeSource::default()),
        }
    };
    config.codes_member = args
        .codes_member
        .clone()
        .or(file.codes_member)
        .unwrap_or_else(|| DEFAULT_CODES_MEMBER.to_string());
    config.procedure_codes = args.procedure_codes.clone().or(file.procedure_codes_file);
    config.worker = WorkerOptions {
        attachments_dir: args.attachments_dir.clone().or(file.attachments_dir),
        id_strategy: if args.deterministic_ids {
            IdStrategy::Deterministic
        } else {
            file.id_strategy.unwrap_or_default()
        },
    };
    config
}

fn code_source(value: &str) -> Option<CodeSource> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NO_CODES) {
        None
    } else {
        Some(CodeSource::parse(value))
    }
}
