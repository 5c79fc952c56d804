//! # contract: seams between the driver, the extraction API and the rule-sets
//!
//! - [`Extractor`] sends one file to the extraction API. The real client lives in
//!   [`crate::upload`]; tests use the generated `MockExtractor`.
//! - [`Flattener`] turns one [`RawResponse`] into rows. The concrete rule-sets
//!   live in [`crate::flatten`].
//!
//! ## Mocking & Testing
//! The extractor trait is annotated for `mockall` (behind the default
//! `test-export-mocks` feature) so integration tests can drive the batch without a network.

use async_trait::async_trait;
use serde_json::Value;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::response::{FlatRow, RawResponse};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One file, ready to send.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Bare file name, used for logging and the multipart part name.
    pub filename: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
    /// Best-effort MIME type guessed from the extension.
    pub content_type: String,
}

/// Sends a document to the extraction API and returns the parsed JSON body.
///
/// Implementors surface transport failures, non-2xx statuses and unparsable
/// bodies as errors; the batch driver turns those into per-file error records.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, req: ExtractRequest) -> Result<Value, BoxError>;
}

/// Column layout a rule-set produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Fixed columns, in output order.
    Fixed(&'static [&'static str]),
    /// Columns discovered from the rows themselves (`filename` first, then first appearance).
    Discovered,
}

/// A rule-set: maps one response to zero or more rows.
///
/// Implementations must be total over arbitrary input: missing or oddly shaped
/// fields become empty cells, never panics or errors.
pub trait Flattener: Send + Sync {
    fn name(&self) -> &'static str;

    fn header(&self) -> Header;

    fn flatten(&self, response: &RawResponse) -> Vec<FlatRow>;
}
