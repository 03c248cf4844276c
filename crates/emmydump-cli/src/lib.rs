//! Library interface for the emmydump CLI

pub mod config;

use anyhow::{Context, Result};
use emmydump_codegen::{dumper_for, DumpOptions, DumpReport, Dumper};
use emmydump_core::{Catalog, GenericMerger};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::config::Settings;

/// Everything a `dump` run produced, written out by `--report`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub catalog: PathBuf,
    pub analyzed_symbols: usize,
    pub catalog_types: usize,
    pub type_definitions: usize,
    pub merged_count: usize,
    pub flavors: Vec<DumpReport>,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.flavors.iter().map(|r| r.files.len()).sum()
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| format!("Failed to load catalog {:?}", path))
}

/// Merge constructed generics, then dump every enabled flavor in order
#[instrument(skip(settings), fields(output = ?settings.output_dir))]
pub fn run_dump(catalog_path: &Path, settings: &Settings) -> Result<RunSummary> {
    let catalog = load_catalog(catalog_path)?;
    info!("Analyzed {} symbols", catalog.stats.analyzed_symbols);

    let merged = GenericMerger::new().merge(&catalog.types);
    info!("Produced {} type definitions", merged.types.len());
    info!(
        "Merged {} generic instances into {} definitions",
        merged.merged_count, merged.definitions_created
    );

    let mut summary = RunSummary {
        catalog: catalog_path.to_path_buf(),
        analyzed_symbols: catalog.stats.analyzed_symbols,
        catalog_types: catalog.len(),
        type_definitions: merged.types.len(),
        merged_count: merged.merged_count,
        flavors: Vec::new(),
    };

    let options = DumpOptions {
        chunk_threshold: settings.chunk_threshold,
    };
    for &flavor in &settings.flavors {
        let mut dumper = dumper_for(flavor, options);
        match dumper.dump(&merged.types, &settings.output_dir) {
            Ok(report) => {
                info!("{}: generated {} files", flavor, report.files.len());
                info!("{}: {} unexported type references", flavor, report.unexported_count);
                summary.flavors.push(report);
            }
            Err(e) => {
                error!(
                    "{} failed after {} of {} flavors ({} files written so far)",
                    flavor,
                    summary.flavors.len(),
                    settings.flavors.len(),
                    summary.files_written()
                );
                return Err(e).with_context(|| format!("Failed to dump {} annotations", flavor));
            }
        }
    }

    Ok(summary)
}

/// Merge only: write the normalized catalog back out as JSON
pub fn run_merge(catalog_path: &Path, output: &Path) -> Result<usize> {
    let catalog = load_catalog(catalog_path)?;
    let merged = GenericMerger::new().merge(&catalog.types);
    info!(
        "Merged {} generic instances, {} type definitions remain",
        merged.merged_count,
        merged.types.len()
    );

    let normalized = Catalog {
        types: merged.types,
        stats: catalog.stats,
    };
    write_file(output, &normalized.to_json_string()?)?;
    info!("Wrote merged catalog to {:?}", output);
    Ok(merged.merged_count)
}

pub fn write_report(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    write_file(path, &json)?;
    info!("Wrote run report to {:?}", path);
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
