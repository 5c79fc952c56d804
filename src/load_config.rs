//! `load_config` module: loads a static YAML run config and injects the
//! extraction API secrets from the environment.
//!
//! # Responsibilities
//! - Parse the user-supplied YAML into intermediate (YAML-side) structs
//! - Map them onto the domain [`RunConfig`] (filters, rule-set, body mode, output)
//! - Read `EXTRACTOR_TOKEN` and `EXTRACTOR_ID` from the environment; the YAML never holds secrets
//!
//! # Errors
//! All errors are `anyhow::Error` with the offending path or value in the message,
//! surfaced at the CLI boundary.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::batch::{BatchConfig, FileFilter};
use crate::flatten::FlattenerKind;
use crate::pipeline::{OutputConfig, RunConfig};
use crate::sheet::{SheetOptions, DEFAULT_SHEET_NAME};
use crate::upload::{BodyMode, ExtractorSettings};

pub const TOKEN_ENV: &str = "EXTRACTOR_TOKEN";
pub const EXTRACTOR_ID_ENV: &str = "EXTRACTOR_ID";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize)]
struct StaticConfig {
    endpoint: String,
    source_dir: PathBuf,
    output_path: PathBuf,
    #[serde(default = "default_rule_set")]
    rule_set: FlattenerKind,
    #[serde(default)]
    filter: FilterYaml,
    #[serde(default)]
    body: BodyMode,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    include_index: bool,
    #[serde(default)]
    sheet_name: Option<String>,
    #[serde(default)]
    responses_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FilterYaml {
    #[default]
    All,
    Invoice,
    NameContains(String),
}

fn default_rule_set() -> FlattenerKind {
    FlattenerKind::Generic
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Reads an optional secret; unset and empty are both "absent".
fn secret_from_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var = name, "Secret found in env");
            Some(value)
        }
        _ => {
            warn!(var = name, "Secret not set; requests will be sent without it");
            None
        }
    }
}

/// Loads a static YAML config file (no secrets) and injects secrets from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.endpoint.trim().is_empty() {
        error!(config_path = ?path_ref, "Config has an empty endpoint");
        anyhow::bail!("Config field `endpoint` must not be empty");
    }
    if raw.timeout_secs == 0 {
        anyhow::bail!("Config field `timeout_secs` must be greater than zero");
    }

    let filter = match raw.filter {
        FilterYaml::All => FileFilter::All,
        FilterYaml::Invoice => FileFilter::invoice(),
        FilterYaml::NameContains(needle) => FileFilter::NameContains(needle),
    };

    let config = RunConfig {
        batch: BatchConfig {
            source_dir: raw.source_dir,
            filter,
        },
        extractor: ExtractorSettings {
            endpoint: raw.endpoint,
            token: secret_from_env(TOKEN_ENV),
            extractor_id: secret_from_env(EXTRACTOR_ID_ENV),
            body: raw.body,
            timeout: Duration::from_secs(raw.timeout_secs),
        },
        rule_set: raw.rule_set,
        output: OutputConfig {
            path: raw.output_path,
            sheet: SheetOptions {
                include_index: raw.include_index,
                sheet_name: raw
                    .sheet_name
                    .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            },
            responses_path: raw.responses_path,
        },
    };

    info!(
        source_dir = %config.batch.source_dir.display(),
        filter = ?config.batch.filter,
        rule_set = ?config.rule_set,
        output = %config.output.path.display(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}
