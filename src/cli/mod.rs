use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mzbin::config::DEFAULT_CONFIG_FILE;
use mzbin::writer::OutputFormat;

mod batch;
mod extract_ids;
mod process;

/// mzbin - LC-MS feature extraction, binning and TIC normalization
#[derive(Parser)]
#[command(name = "mzbin")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Input mzML file
    #[arg(short, long, value_name = "FILE", required = true)]
    input: Option<PathBuf>,

    /// Output feature table (.parquet, or .feather/.arrow/.ipc for Arrow IPC)
    #[arg(short, long, value_name = "FILE", required = true)]
    output: Option<PathBuf>,

    /// Parameter file (JSON, or TOML when ending in .toml)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output container for batch runs.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum FormatArg {
    /// Apache Parquet
    #[default]
    Parquet,
    /// Arrow IPC (Feather v2)
    Feather,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Parquet => OutputFormat::Parquet,
            FormatArg::Feather => OutputFormat::ArrowIpc,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a filename,sample_id CSV for every mzML file in a directory
    ExtractIds {
        /// Directory containing mzML files
        #[arg(long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Output CSV path
        #[arg(short, long, value_name = "FILE", default_value = "sample_ids.csv")]
        output: PathBuf,
    },

    /// Process every mzML file in a directory
    Batch {
        /// Directory containing mzML files
        #[arg(long, value_name = "DIR")]
        input_dir: PathBuf,

        /// Directory receiving one feature table per input
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Parameter file (JSON, or TOML when ending in .toml)
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Output container
        #[arg(short, long, default_value = "parquet", value_enum)]
        format: FormatArg,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::ExtractIds { input_dir, output }) => extract_ids::run(input_dir, output),
        Some(Commands::Batch {
            input_dir,
            output_dir,
            config,
            format,
        }) => batch::run(input_dir, output_dir, config, OutputFormat::from(format)),
        None => match (cli.input, cli.output) {
            (Some(input), Some(output)) => process::run(input, output, cli.config),
            _ => anyhow::bail!("--input and --output are required"),
        },
    }
}
