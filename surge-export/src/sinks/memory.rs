//! In-memory sink

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::ExportResult;
use crate::sink::{BatchReport, ExportDocument, ExportSink};

/// Keeps every exported document; clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    documents: Arc<Mutex<Vec<ExportDocument>>>,
    batches: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self) -> Vec<ExportDocument> {
        self.documents.lock().await.clone()
    }

    /// Documents stored for one index
    pub async fn documents_in(&self, index: &str) -> Vec<ExportDocument> {
        self.documents
            .lock()
            .await
            .iter()
            .filter(|doc| doc.index == index)
            .cloned()
            .collect()
    }

    pub async fn batch_count(&self) -> usize {
        *self.batches.lock().await
    }
}

#[async_trait]
impl ExportSink for MemorySink {
    async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport> {
        let started = Instant::now();
        self.documents.lock().await.extend_from_slice(batch);
        *self.batches.lock().await += 1;
        Ok(BatchReport::accepted(self.sink_type(), batch.len(), started.elapsed()))
    }

    fn sink_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_sink_keeps_documents() {
        let sink = MemorySink::new();
        let shared = sink.clone();

        let report = sink
            .export(&[
                ExportDocument::new("a", "1", json!({})),
                ExportDocument::new("b", "2", json!({})),
            ])
            .await
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert!(report.is_complete());
        assert_eq!(shared.documents().await.len(), 2);
        assert_eq!(shared.documents_in("b").await[0].id, "2");
        assert_eq!(shared.batch_count().await, 1);
    }
}
