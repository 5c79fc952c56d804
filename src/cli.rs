//! Command-line interface: argument parsing and the testable [`run`] entrypoint.
//!
//! - `run --config <yaml>` uploads a folder and writes the spreadsheet.
//! - `flatten --responses <json> --output <xlsx>` re-flattens a saved response dump
//!   without contacting the API.
//!
//! All business logic lives in the library modules; this file is glue.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::flatten::{flatten_all, flattener_for, FlattenerKind};
use crate::load_config::load_config;
use crate::pipeline;
use crate::sheet::{read_responses_json, write_xlsx, SheetOptions};
use crate::upload::ExtractorClient;

/// Upload documents to an extraction API and flatten the results into a spreadsheet.
#[derive(Parser)]
#[clap(
    name = "extract-sheet",
    version,
    about = "Upload a folder of documents to an extraction API and write the extracted fields to a spreadsheet"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every matching file and write the flattened results
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Flatten a saved raw-response dump into a spreadsheet
    Flatten {
        /// JSON dump written by a previous run (`responses_path`)
        #[clap(long)]
        responses: PathBuf,
        /// Spreadsheet to write
        #[clap(long)]
        output: PathBuf,
        /// Rule-set used to flatten the responses
        #[clap(long, value_enum, default_value = "generic")]
        rule_set: FlattenerKind,
        /// Write a leading positional index column
        #[clap(long)]
        include_index: bool,
    },
}

/// Async CLI entrypoint shared by `main()` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let config = load_config(&config)?;
            tracing::info!(command = "run", "Starting extraction run");
            let client = ExtractorClient::new(config.extractor.clone())
                .map_err(|e| anyhow::anyhow!("Failed to construct extraction client: {e}"))?;
            match pipeline::run(&config, &client).await {
                Ok(report) => {
                    tracing::info!(command = "run", ?report, "Run complete");
                    println!(
                        "Processed {} files ({} ok, {} failed); wrote {} rows to {}",
                        report.files,
                        report.succeeded,
                        report.failed,
                        report.rows,
                        report.output_path.display()
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Run failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Flatten {
            responses,
            output,
            rule_set,
            include_index,
        } => {
            let raw = read_responses_json(&responses)
                .with_context(|| format!("Failed to load responses from {}", responses.display()))?;
            let flattener = flattener_for(rule_set);
            let table = flatten_all(flattener.as_ref(), &raw);
            let options = SheetOptions {
                include_index,
                ..SheetOptions::default()
            };
            write_xlsx(&table, &output, &options)?;
            println!(
                "Flattened {} responses into {} rows at {}",
                raw.len(),
                table.len(),
                output.display()
            );
            Ok(())
        }
    }
}
