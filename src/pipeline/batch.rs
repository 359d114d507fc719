//! Multi-file processing
//!
//! Every input is processed independently; a failing file is logged and
//! counted, never aborting the rest. With the `parallel` feature files are
//! spread over the rayon thread pool.
//!
//! Output names come from the input file stem. When two inputs map to the
//! same output (`a.mzML` and `a.MZML`, compared case-insensitively), the
//! first in input order is processed and the later ones are counted as
//! failed without being read.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{error, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{fallback_sample_id, FeaturePipeline};
use crate::detection::FeatureDetector;
use crate::writer::{FeatureTableWriter, OutputFormat};

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Files written successfully
    pub written: Vec<PathBuf>,
    /// Inputs that produced no output
    pub failed: Vec<PathBuf>,
}

impl BatchSummary {
    /// Number of files written
    pub fn processed_count(&self) -> usize {
        self.written.len()
    }

    /// Number of files skipped
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

enum FileOutcome {
    Written(PathBuf),
    Failed(PathBuf),
}

/// mzML files in `dir` (extension matched case-insensitively), sorted by path
pub fn find_mzml_files<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_mzml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mzml"));
        if is_mzml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

impl<D: FeatureDetector + Sync> FeaturePipeline<D> {
    /// Process `inputs`, writing `<stem>.<ext>` files into `output_dir`
    pub fn process_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        format: OutputFormat,
        writer: &FeatureTableWriter,
    ) -> BatchSummary {
        info!(
            "Processing {} files into {}",
            inputs.len(),
            output_dir.display()
        );

        let jobs = plan_outputs(inputs, output_dir, format);

        #[cfg(feature = "parallel")]
        let outcomes: Vec<FileOutcome> = jobs
            .par_iter()
            .map(|(input, output)| self.process_one(input, output.as_deref(), writer))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<FileOutcome> = jobs
            .iter()
            .map(|(input, output)| self.process_one(input, output.as_deref(), writer))
            .collect();

        let mut summary = BatchSummary::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Written(path) => summary.written.push(path),
                FileOutcome::Failed(path) => summary.failed.push(path),
            }
        }
        info!(
            "Batch complete: {} processed, {} failed",
            summary.processed_count(),
            summary.failed_count()
        );
        summary
    }

    fn process_one(
        &self,
        input: &Path,
        output: Option<&Path>,
        writer: &FeatureTableWriter,
    ) -> FileOutcome {
        let Some(output) = output else {
            return FileOutcome::Failed(input.to_path_buf());
        };
        let Some(record) = self.process(input) else {
            return FileOutcome::Failed(input.to_path_buf());
        };
        match writer.write_file(output, &record) {
            Ok(_) => FileOutcome::Written(output.to_path_buf()),
            Err(e) => {
                error!("Error writing {}: {}", output.display(), e);
                FileOutcome::Failed(input.to_path_buf())
            }
        }
    }
}

/// Pair every input with its output path; `None` marks an input whose output
/// name is already taken by an earlier input.
fn plan_outputs<'a>(
    inputs: &'a [PathBuf],
    output_dir: &Path,
    format: OutputFormat,
) -> Vec<(&'a Path, Option<PathBuf>)> {
    let mut claimed: HashMap<String, &Path> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let name = format!("{}.{}", fallback_sample_id(input), format.extension());
            match claimed.entry(name.to_lowercase()) {
                Entry::Occupied(first) => {
                    error!(
                        "Skipping {}: output {} is already produced by {}",
                        input.display(),
                        name,
                        first.get().display()
                    );
                    (input.as_path(), None)
                }
                Entry::Vacant(slot) => {
                    slot.insert(input);
                    (input.as_path(), Some(output_dir.join(name)))
                }
            }
        })
        .collect()
}
