#![doc = "HTTP client for the extraction API: implements the `Extractor` seam with reqwest."]
//
//! # Extraction client
//!
//! [`ExtractorClient`] posts one file per request to the configured endpoint.
//!
//! - `raw` body mode sends the file bytes as the request body, with the worker
//!   token and extractor id headers and a `Content-Type` guessed from the extension.
//! - `multipart` body mode sends a single `file` form part, for endpoints that
//!   expect a form upload.
//!
//! Secrets are never compiled in: the token and extractor id come from
//! [`ExtractorSettings`], filled by the config loader from the environment.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::contract::{BoxError, ExtractRequest, Extractor};

pub const TOKEN_HEADER: &str = "X-WORKER-TOKEN";
pub const EXTRACTOR_ID_HEADER: &str = "X-WORKER-EXTRACTOR-ID";

/// Longest slice of an error response body kept in the error message.
const ERROR_BODY_EXCERPT: usize = 300;

/// How the file is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyMode {
    /// File bytes are the request body.
    #[default]
    Raw,
    /// `multipart/form-data` with one `file` part.
    Multipart,
}

#[derive(Clone)]
pub struct ExtractorSettings {
    pub endpoint: String,
    pub token: Option<String>,
    pub extractor_id: Option<String>,
    pub body: BodyMode,
    pub timeout: Duration,
}

// Keeps the token out of `?config` log lines.
impl fmt::Debug for ExtractorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorSettings")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("extractor_id", &self.extractor_id)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct ExtractorClient {
    http: reqwest::Client,
    settings: ExtractorSettings,
}

impl ExtractorClient {
    pub fn new(settings: ExtractorSettings) -> Result<Self, BoxError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                e
            })?;
        tracing::info!(
            endpoint = %settings.endpoint,
            token_set = settings.token.is_some(),
            extractor_id_set = settings.extractor_id.is_some(),
            body = ?settings.body,
            timeout_secs = settings.timeout.as_secs(),
            "Initialized ExtractorClient"
        );
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    fn with_auth(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.settings.token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(id) = &self.settings.extractor_id {
            request = request.header(EXTRACTOR_ID_HEADER, id);
        }
        request
    }
}

#[async_trait]
impl Extractor for ExtractorClient {
    async fn extract(&self, req: ExtractRequest) -> Result<Value, BoxError> {
        let request = self.with_auth(self.http.post(&self.settings.endpoint));

        let request = match self.settings.body {
            BodyMode::Raw => request
                .header(CONTENT_TYPE, req.content_type.as_str())
                .body(req.content),
            BodyMode::Multipart => {
                let part = reqwest::multipart::Part::bytes(req.content)
                    .file_name(req.filename.clone())
                    .mime_str(&req.content_type)?;
                request.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        tracing::debug!(file = %req.filename, endpoint = %self.settings.endpoint, "POST extraction request");
        let response = request.send().await.map_err(|e| {
            tracing::error!(file = %req.filename, error = ?e, "Extraction request failed");
            e
        })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let excerpt: String = text.chars().take(ERROR_BODY_EXCERPT).collect();
            tracing::error!(file = %req.filename, status = %status, body = %excerpt, "Extraction API returned error status");
            return Err(format!("HTTP {status} from extraction API: {excerpt}").into());
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(file = %req.filename, error = ?e, "Extraction API returned invalid JSON");
            format!("invalid JSON in extraction response: {e}")
        })?;
        Ok(body)
    }
}
