use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use fhir_cli::cli::{GroupArgs, RunArgs};
use fhir_cli::config::resolve;
use fhir_core::Scheduler;
use fhir_ingest::group_folder;
use fhir_map::default_registry;
use fhir_output::write_json_file;

use crate::progress::ProgressObserver;
use crate::summary::{apply_table_style, header_cell};
use crate::types::{BundleRun, GroupRun};

pub fn run_domains() -> Result<()> {
    let registry = default_registry();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("Resources"),
        header_cell("Mapper"),
    ]);
    apply_table_style(&mut table);
    for domain in registry.domains() {
        let description = registry
            .get(domain)
            .map(|mapper| mapper.description())
            .unwrap_or_default();
        table.add_row(vec![
            domain.to_string(),
            domain.resource_types().join(", "),
            description.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_bundles(args: &RunArgs) -> Result<BundleRun> {
    let config = resolve(args).context("load configuration")?;
    let output_dir = config.output_dir.clone();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let progress = Arc::new(ProgressObserver::new());
    let mut scheduler = Scheduler::new(config).with_observer(progress.clone());
    let result = runtime.block_on(scheduler.run());
    progress.finish();
    let summary = result.context("bundle run")?;

    if let Some(path) = &args.report {
        let written = write_json_file(path, &summary)
            .with_context(|| format!("write run report {}", path.display()))?;
        info!(path = %written.path.display(), bytes = written.bytes, "wrote run report");
    }

    Ok(BundleRun {
        output_dir,
        report: args.report.clone(),
        summary,
    })
}

pub fn run_group(args: &GroupArgs) -> Result<GroupRun> {
    let span = info_span!("group", folder = %args.folder.display());
    let _guard = span.enter();
    let started = Instant::now();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.folder.join("output"));

    let report = group_folder(&args.folder, &output_dir)
        .with_context(|| format!("group tables in {}", args.folder.display()))?;
    info!(
        patients = report.written.len(),
        duration_ms = started.elapsed().as_millis(),
        "grouping complete"
    );
    Ok(GroupRun {
        folder: args.folder.clone(),
        output_dir,
        report,
    })
}
