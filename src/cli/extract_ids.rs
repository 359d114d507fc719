use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzbin::mzml::get_sample_id;
use mzbin::pipeline::find_mzml_files;

/// Placeholder for files without a sample id
const MISSING_SAMPLE_ID: &str = "N/A";

/// Write a `filename,sample_id` CSV for every mzML file in a directory
pub fn run(input_dir: PathBuf, output: PathBuf) -> Result<()> {
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", input_dir.display());
    }
    let files = find_mzml_files(&input_dir)
        .with_context(|| format!("Failed to list {}", input_dir.display()))?;
    if files.is_empty() {
        anyhow::bail!("No mzML files found in {}", input_dir.display());
    }

    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    writer.write_record(["filename", "sample_id"])?;

    let mut found = 0usize;
    for path in &files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sample_id = get_sample_id(path);
        if sample_id.is_some() {
            found += 1;
        }
        writer.write_record([
            filename.as_str(),
            sample_id.as_deref().unwrap_or(MISSING_SAMPLE_ID),
        ])?;
    }
    writer.flush()?;

    info!(
        "Extracted {} sample ids from {} files into {}",
        found,
        files.len(),
        output.display()
    );
    Ok(())
}
