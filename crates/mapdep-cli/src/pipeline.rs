/// The batch pipeline behind the single `mapdep` command.
///
/// One run: load the configuration, locate the version folders, ingest
/// the extracted RETW files, derive the run plan and the file-dependency
/// view, and write both as JSON into a fresh version folder. Inputs are
/// read from the latest existing version (where the external extractor
/// left them); outputs go to the next patch version.
///
/// Diagnostics accumulated during the run are printed to stderr; if any
/// reach error severity the run exits 1 even though the artifacts were
/// written, so callers can gate on data quality.
use std::path::Path;

use serde::Serialize;
use tracing::info;

use mapdep_core::{
    DepGraph, DiagnosticSink, EtlDag, GraphStore, Ingestor, Severity, file_dependencies,
};

use crate::config::ConfigData;
use crate::error::CliError;
use crate::versioning::scan_version_dirs;

/// File name of the emitted run plan.
pub const MAPPING_ORDER_FILE: &str = "mapping_order.json";
/// File name of the emitted file-dependency view.
pub const FILE_DEPENDENCIES_FILE: &str = "file_dependencies.json";

/// Executes one pipeline run (or reports it, with `dry_run`).
pub fn run(config_path: &Path, dry_run: bool) -> Result<(), CliError> {
    let config = ConfigData::load(config_path)?;
    let workload_root = config.workload_root();
    let versions = scan_version_dirs(&workload_root)?;

    let Some(current) = &versions.current else {
        return Err(CliError::NoInputFiles);
    };
    let input_root = workload_root.join(current);
    let output_root = workload_root.join(&versions.next);
    let inputs = config.retw_files(&input_root);
    if inputs.is_empty() {
        return Err(CliError::NoInputFiles);
    }

    if dry_run {
        println!("workload:       {}", config.title);
        println!("input version:  {}", input_root.display());
        println!("output version: {}", output_root.display());
        for input in &inputs {
            println!("would ingest:   {}", input.display());
        }
        println!(
            "would write:    {}",
            output_root.join(MAPPING_ORDER_FILE).display()
        );
        println!(
            "would write:    {}",
            output_root.join(FILE_DEPENDENCIES_FILE).display()
        );
        return Ok(());
    }

    let mut store = GraphStore::new();
    let mut sink = DiagnosticSink::new();
    let ingested = Ingestor::new(&mut store, &mut sink).add_files(&inputs);

    // Surface every finding before deciding the outcome.
    for issue in sink.issues() {
        eprintln!("{issue}");
    }
    if !ingested {
        return Err(CliError::IngestFailed);
    }

    let dag = EtlDag::build(&store).map_err(|e| CliError::RunPlanFailed {
        detail: e.to_string(),
    })?;
    let order = dag.mapping_order();
    let deps = file_dependencies(&DepGraph::from_store(&store));

    std::fs::create_dir_all(&output_root).map_err(|e| CliError::OutputWrite {
        path: output_root.clone(),
        detail: e.to_string(),
    })?;
    write_json(&output_root.join(MAPPING_ORDER_FILE), &order)?;
    write_json(&output_root.join(FILE_DEPENDENCIES_FILE), &deps)?;
    info!(
        mappings = order.len(),
        files = store.file_count(),
        output = %output_root.display(),
        "pipeline run complete"
    );
    println!(
        "{} mapping(s) planned across {} file(s); artifacts in {}",
        order.len(),
        store.file_count(),
        output_root.display()
    );

    if sink.has_errors() {
        let qty_errors = sink
            .issues()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        return Err(CliError::IssuesFound { qty_errors });
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::OutputWrite {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    std::fs::write(path, text).map_err(|e| CliError::OutputWrite {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
