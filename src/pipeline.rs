//! High-level run: upload → flatten → write.
//!
//! [`run`] drives one batch end to end:
//!   - uploads every matching file in the source directory through an [`Extractor`]
//!   - optionally dumps the raw responses as JSON
//!   - flattens the responses with the configured rule-set
//!   - writes the spreadsheet
//!
//! Per-file upload failures end up as rows with an `Error` value; only an
//! unreadable source directory or an unwritable output aborts the run.

use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::batch::{run_batch, BatchConfig, BatchError};
use crate::contract::Extractor;
use crate::flatten::{flatten_all, flattener_for, FlattenerKind};
use crate::sheet::{write_responses_json, write_xlsx, SheetError, SheetOptions};
use crate::upload::ExtractorSettings;

/// Everything one run needs, as assembled by [`crate::load_config::load_config`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub batch: BatchConfig,
    pub extractor: ExtractorSettings,
    pub rule_set: FlattenerKind,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub sheet: SheetOptions,
    /// Where to keep the unflattened responses, if anywhere.
    pub responses_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunReport {
    pub files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Output(#[from] SheetError),
}

pub async fn run<E>(config: &RunConfig, extractor: &E) -> Result<RunReport, RunError>
where
    E: Extractor + ?Sized,
{
    info!(
        source_dir = %config.batch.source_dir.display(),
        rule_set = ?config.rule_set,
        output = %config.output.path.display(),
        "Starting extraction run"
    );

    let batch = run_batch(&config.batch, extractor).await.map_err(|e| {
        error!(error = %e, "Batch failed before any upload");
        e
    })?;

    if let Some(dump_path) = &config.output.responses_path {
        write_responses_json(&batch.responses, dump_path)?;
    }

    let flattener = flattener_for(config.rule_set);
    let table = flatten_all(flattener.as_ref(), &batch.responses);
    write_xlsx(&table, &config.output.path, &config.output.sheet)?;

    Ok(RunReport {
        files: batch.responses.len(),
        succeeded: batch.succeeded,
        failed: batch.failed,
        rows: table.len(),
        output_path: config.output.path.clone(),
    })
}
