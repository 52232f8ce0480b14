use std::path::PathBuf;

use fhir_core::RunSummary;
use fhir_ingest::GroupingReport;

#[derive(Debug)]
pub struct BundleRun {
    pub output_dir: PathBuf,
    pub report: Option<PathBuf>,
    pub summary: RunSummary,
}

impl BundleRun {
    pub fn has_errors(&self) -> bool {
        self.summary.has_failures()
    }
}

#[derive(Debug)]
pub struct GroupRun {
    pub folder: PathBuf,
    pub output_dir: PathBuf,
    pub report: GroupingReport,
}
