//! # mzbin
//!
//! Command-line front end for the feature pipeline.
//!
//! ```bash
//! # One file, parameters from ./params.json
//! mzbin --input QC_01.mzML --output QC_01.parquet
//!
//! # Arrow IPC output and a TOML parameter file
//! mzbin -i QC_01.mzML -o QC_01.feather -c params.toml -v
//!
//! # Every mzML file in a directory
//! mzbin batch --input-dir raw/ --output-dir features/
//!
//! # Sample id report
//! mzbin extract-ids --input-dir raw/ --output sample_ids.csv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
