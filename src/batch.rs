//! Batch driver: walks the source directory and uploads each matching file.
//!
//! Files are processed one after another; each upload finishes before the next
//! file is read. A failed upload never stops the batch: it becomes a
//! [`RawResponse`] carrying an `error` so the file still shows up in the output.
//! Only an unreadable source directory is fatal.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{ExtractRequest, Extractor};
use crate::response::RawResponse;

/// Content type used when the extension tells us nothing.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Which files in the source directory get uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileFilter {
    #[default]
    All,
    /// Case-insensitive substring of the file name.
    NameContains(String),
}

impl FileFilter {
    /// Only files with "invoice" somewhere in the name.
    pub fn invoice() -> Self {
        FileFilter::NameContains("invoice".to_string())
    }

    pub fn matches(&self, filename: &str) -> bool {
        match self {
            FileFilter::All => true,
            FileFilter::NameContains(needle) => filename
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

/// True when "invoice" appears anywhere in `filename`, ignoring case.
pub fn is_invoice_file(filename: &str) -> bool {
    FileFilter::invoice().matches(filename)
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source_dir: PathBuf,
    pub filter: FileFilter,
}

#[derive(Debug)]
pub struct BatchReport {
    /// One response per uploaded file, in upload order.
    pub responses: Vec<RawResponse>,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read source directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Regular files in `config.source_dir` that pass the filter, sorted by name.
pub async fn list_files(config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    let read_dir_error = |source| BatchError::ReadDir {
        path: config.source_dir.clone(),
        source,
    };
    let mut entries = tokio::fs::read_dir(&config.source_dir)
        .await
        .map_err(read_dir_error)?;

    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = ?e, dir = %config.source_dir.display(), "Stopped reading directory entries");
                break;
            }
        };
        let path = entry.path();
        // Follows symlinks, like `Path::is_file`.
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }
        if !config.filter.matches(&file_name(&path)) {
            debug!(path = %path.display(), filter = ?config.filter, "File does not match filter");
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// MIME type from the file extension, or [`FALLBACK_CONTENT_TYPE`].
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Uploads a single file. Never fails: problems come back as an error record.
pub async fn upload_one<E>(path: &Path, extractor: &E) -> RawResponse
where
    E: Extractor + ?Sized,
{
    let filename = file_name(path);

    let content = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(file = %filename, error = ?e, "Failed to read file");
            return RawResponse::failed(filename, path.display(), format!("failed to read file: {e}"));
        }
    };

    let req = ExtractRequest {
        filename: filename.clone(),
        content,
        content_type: guess_content_type(path),
    };
    debug!(file = %filename, content_type = %req.content_type, bytes = req.content.len(), "Sending file to extractor");

    match extractor.extract(req).await {
        Ok(Value::Object(body)) => {
            info!(file = %filename, "Extraction succeeded");
            RawResponse::from_body(filename, body)
        }
        Ok(other) => {
            error!(file = %filename, body = %other, "Extractor returned a non-object body");
            RawResponse::failed(filename, path.display(), "response body is not a JSON object")
        }
        Err(e) => {
            error!(file = %filename, error = %e, "Extraction failed");
            RawResponse::failed(filename, path.display(), e.to_string())
        }
    }
}

/// Uploads every matching file in order and collects the responses.
pub async fn run_batch<E>(config: &BatchConfig, extractor: &E) -> Result<BatchReport, BatchError>
where
    E: Extractor + ?Sized,
{
    let files = list_files(config).await?;
    info!(
        dir = %config.source_dir.display(),
        files = files.len(),
        "Found files to upload"
    );

    let mut responses = Vec::with_capacity(files.len());
    let mut failed = 0;
    for (index, path) in files.iter().enumerate() {
        info!(file = %path.display(), n = index + 1, of = files.len(), "Uploading");
        let response = upload_one(path, extractor).await;
        if response.error().is_some() {
            failed += 1;
        }
        responses.push(response);
    }

    let succeeded = responses.len() - failed;
    info!(succeeded, failed, "Batch complete");
    Ok(BatchReport {
        responses,
        succeeded,
        failed,
    })
}
