use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzbin::config::PipelineParams;
use mzbin::pipeline::{find_mzml_files, FeaturePipeline};
use mzbin::writer::{FeatureTableWriter, OutputFormat};

/// Process a directory of mzML files
pub fn run(
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: PathBuf,
    format: OutputFormat,
) -> Result<()> {
    let params = PipelineParams::from_file(&config)
        .with_context(|| format!("Failed to load parameters from {}", config.display()))?;

    if !input_dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", input_dir.display());
    }
    let inputs = find_mzml_files(&input_dir)
        .with_context(|| format!("Failed to list {}", input_dir.display()))?;
    if inputs.is_empty() {
        anyhow::bail!("No mzML files found in {}", input_dir.display());
    }
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    #[cfg(feature = "parallel")]
    info!("Parallel processing with {} threads", rayon::current_num_threads());

    let pipeline = FeaturePipeline::new(params.clone())?;
    let writer = FeatureTableWriter::new().with_params(params);
    let summary = pipeline.process_batch(&inputs, &output_dir, format, &writer);

    info!(
        "{} of {} files processed",
        summary.processed_count(),
        inputs.len()
    );
    Ok(())
}
