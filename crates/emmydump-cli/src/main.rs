use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use emmydump::config::{DumpConfig, Overrides, Settings};
use emmydump::{run_dump, run_merge, write_report};
use emmydump_codegen::Flavor;

#[derive(Parser)]
#[command(name = "emmydump")]
#[command(about = "Generate EmmyLua annotations for xLua and toLua bindings", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge generic instances and write annotation files
    Dump {
        /// Type catalog (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Flavors to generate (xlua, tolua); defaults to both
        #[arg(short, long = "flavor", value_delimiter = ',')]
        flavors: Vec<Flavor>,

        /// TOML configuration file
        #[arg(short, long, env = "EMMYDUMP_CONFIG")]
        config: Option<PathBuf>,

        /// Maximum size of one output file in KiB
        #[arg(long)]
        chunk_threshold_kib: Option<usize>,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Merge generic instances only and write the resulting catalog
    Merge {
        /// Type catalog (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output catalog path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Dump {
            input,
            output,
            flavors,
            config,
            chunk_threshold_kib,
            report,
        } => {
            let file_config = match config {
                Some(path) => DumpConfig::load(&path)?,
                None => DumpConfig::default(),
            };
            let settings = Settings::resolve(
                &file_config,
                Overrides {
                    output_dir: output,
                    chunk_threshold_kib,
                    flavors,
                },
            )?;

            let summary = run_dump(&input, &settings)?;
            if let Some(path) = report {
                write_report(&summary, &path)?;
            }
            info!(
                "Done: {} type definitions, {} files in {:?}",
                summary.type_definitions,
                summary.files_written(),
                settings.output_dir
            );
            Ok(())
        }
        Commands::Merge { input, output } => {
            run_merge(&input, &output)?;
            Ok(())
        }
    }
}
