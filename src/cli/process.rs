use anyhow::{Context, Result};
use log::{error, info};
use std::path::PathBuf;

use mzbin::config::PipelineParams;
use mzbin::pipeline::FeaturePipeline;
use mzbin::writer::FeatureTableWriter;

/// Process one mzML file into a feature table.
///
/// Only parameter errors fail the command; a file that cannot be processed or
/// written is logged and leaves no output behind.
pub fn run(input: PathBuf, output: PathBuf, config: PathBuf) -> Result<()> {
    let params = PipelineParams::from_file(&config)
        .with_context(|| format!("Failed to load parameters from {}", config.display()))?;

    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());
    info!(
        "Parameters: {} ppm, min intensity {}, bins {} m/z x {} s",
        params.mass_error_ppm, params.min_intensity, params.mz_bin_size, params.rt_bin_size
    );

    let pipeline = FeaturePipeline::new(params.clone())?;
    let Some(record) = pipeline.process(&input) else {
        return Ok(());
    };

    let writer = FeatureTableWriter::new().with_params(params);
    if let Err(e) = writer.write_file(&output, &record) {
        error!("Error writing {}: {}", output.display(), e);
        return Ok(());
    }
    info!(
        "Sample {}: {} features written to {}",
        record.sample_id,
        record.len(),
        output.display()
    );
    Ok(())
}
