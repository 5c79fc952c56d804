//! extract-sheet: upload a folder of documents to an extraction API and flatten
//! the structured responses into spreadsheet rows.
//!
//! Data flows `batch` → [`response::RawResponse`] → `flatten` → [`response::Table`] → `sheet`.

pub mod batch;
pub mod cli;
pub mod contract;
pub mod flatten;
pub mod load_config;
pub mod lookup;
pub mod pipeline;
pub mod response;
pub mod sheet;
pub mod upload;

pub use cli::{run, Cli, Commands};
