use anyhow::{Context, Result};
use std::path::PathBuf;

use swimcube::dataset::CubeReader;

use super::heading;

/// Display information about a cube dataset
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let reader = CubeReader::open(&file)
        .with_context(|| format!("Failed to read cube dataset {}", file.display()))?;
    let meta = reader.metadata();

    println!("{}", heading("swimcube Dataset Information"));
    println!("============================");
    println!("File: {}", file.display());
    println!();

    println!("{}", heading("Cube:"));
    println!("  Kind: {}", meta.kind);
    println!("  Format version: {}", meta.format_version);
    println!("  Dimensions: ({})", meta.dims.join(", "));
    println!("  Shape: {} x {}", meta.shape.0, meta.shape.1);
    println!("  Variable: {}", meta.variable);
    println!();

    println!("{}", heading("File Statistics:"));
    println!("  Row groups: {}", meta.num_row_groups);
    println!("  Total rows: {}", meta.total_rows);
    println!();

    if let Some(provenance) = &meta.cube_metadata {
        println!("{}", heading("Provenance:"));
        if let Some(source) = &provenance.source_file {
            println!("  Source: {}", source.name);
            if let Some(path) = &source.path {
                println!("  Path: {}", path);
            }
        }
        if let Some(config) = &provenance.extraction_config {
            println!(
                "  Extraction: {} pulses, sampling period {}, gap threshold {}, strategy {}",
                config.unique_swim_ids,
                config.instrument_sampling_period,
                config.gap_threshold,
                config.fft_strategy
            );
        }
        if let Some(history) = &provenance.processing_history {
            for step in &history.steps {
                let parameters: Vec<String> = step
                    .parameters
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                println!(
                    "  Step {}: {} ({})",
                    step.order,
                    step.processing_type,
                    parameters.join(", ")
                );
            }
        }
        if let Some(converter) = &provenance.converter_info {
            println!("  Written by: {}", converter);
        }
        if let Some(timestamp) = &provenance.conversion_timestamp {
            println!("  Written at: {}", timestamp);
        }
        println!();
    }

    println!("{}", heading("Schema:"));
    for (i, field) in meta.schema.fields().iter().enumerate() {
        println!("  {:3}. {} ({})", i + 1, field.name(), field.data_type());
    }

    Ok(())
}
