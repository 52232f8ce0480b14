//! CLI argument definitions for the FHIR bundler.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use fhir_core::RunMode;

#[derive(Parser)]
#[command(
    name = "fhir-bundler",
    version,
    about = "FHIR bundler - Convert per-patient clinical extracts to FHIR transaction bundles",
    long_about = "Convert per-patient clinical extracts to FHIR R4 transaction bundles.\n\n\
                  Each input JSON file becomes <name>-bundle.json with a Patient entry\n\
                  followed by one entry per mapped record, note and attachment."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient identifiers (MRNs, linkage ids) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bundle every extract in the input directory.
    Run(RunArgs),

    /// Group flat tab-separated tables into one extract per MRN.
    Group(GroupArgs),

    /// List supported clinical domains and the resources they map to.
    Domains,
}

/// Options for `run`. Anything left unset falls back to the config file,
/// then to built-in defaults.
#[derive(Debug, Default, Parser)]
pub struct RunArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory of per-patient JSON extracts (default: ./data).
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory for the generated bundles (default: ./output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Root directory holding one attachment folder per patient.
    #[arg(long = "attachments-dir", value_name = "DIR")]
    pub attachments_dir: Option<PathBuf>,

    /// Which inputs to process.
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Number of files processed at once (default: 8).
    #[arg(long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Fail a file that takes longer than this many seconds.
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Consolidated demographics file to expand into the input directory.
    #[arg(long = "demographics", value_name = "FILE")]
    pub demographics: Option<PathBuf>,

    /// Code list source: URL, zip archive or plain-text file.
    #[arg(long = "codes", value_name = "SRC", conflicts_with = "no_codes")]
    pub codes: Option<String>,

    /// Archive member holding the code list.
    #[arg(long = "codes-member", value_name = "NAME")]
    pub codes_member: Option<String>,

    /// Run without code descriptions.
    #[arg(long = "no-codes")]
    pub no_codes: bool,

    /// CSV of procedure codes (`code,short_description`).
    #[arg(long = "procedure-codes", value_name = "FILE")]
    pub procedure_codes: Option<PathBuf>,

    /// Derive entry ids from file name and position so reruns are identical.
    #[arg(long = "deterministic-ids")]
    pub deterministic_ids: bool,

    /// Write a JSON run report.
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct GroupArgs {
    /// Folder of tab-separated `.tsv`/`.csv` tables.
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Output directory for the per-MRN extracts (default: <FOLDER>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Files,
    Attachments,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Files => RunMode::Files,
            ModeArg::Attachments => RunMode::Attachments,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
