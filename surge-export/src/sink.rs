//! Export sink interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExportResult;

/// One document addressed to an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub index: String,
    pub id: String,
    pub body: Value,
}

impl ExportDocument {
    pub fn new(index: impl Into<String>, id: impl Into<String>, body: Value) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            body,
        }
    }

    /// Serialize `body` and wrap it into a document
    pub fn from_serialize<T: Serialize>(
        index: impl Into<String>,
        id: impl Into<String>,
        body: &T,
    ) -> ExportResult<Self> {
        Ok(Self::new(index, id, serde_json::to_value(body)?))
    }
}

/// A document the sink rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of exporting one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub sink: String,
    pub accepted: usize,
    #[serde(default)]
    pub failures: Vec<DocumentFailure>,
    /// Where the batch ended up (file path, URL)
    #[serde(default)]
    pub location: Option<String>,
    pub elapsed_ms: u64,
}

impl BatchReport {
    pub fn accepted(sink: impl Into<String>, accepted: usize, elapsed: std::time::Duration) -> Self {
        Self {
            sink: sink.into(),
            accepted,
            failures: Vec::new(),
            location: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Destination of export batches
///
/// Sinks never retry; a failed batch is returned to the caller.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Deliver one batch of documents
    async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport>;

    /// Check the sink configuration before any batch is sent
    fn validate_config(&self) -> ExportResult<()> {
        Ok(())
    }

    /// Short sink type name used in reports and logs
    fn sink_type(&self) -> &'static str;
}
