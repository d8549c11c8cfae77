//! Standard output sink

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::{ExportError, ExportResult};
use crate::sink::{BatchReport, ExportDocument, ExportSink};
use crate::sinks::to_json_lines;

/// Standard stream a batch is written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdStream {
    #[default]
    Stdout,
    Stderr,
}

impl StdStream {
    fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Writes batches as JSON lines to stdout or stderr
#[derive(Debug, Clone, Default)]
pub struct StdioSink {
    stream: StdStream,
}

impl StdioSink {
    pub fn new(stream: StdStream) -> Self {
        Self { stream }
    }

    async fn write_all<W: AsyncWrite + Unpin>(&self, writer: W, payload: &[u8]) -> ExportResult<()> {
        let map_err = |e: std::io::Error| ExportError::Stdio {
            stream: self.stream.name().to_string(),
            error: e.to_string(),
        };

        let mut writer = BufWriter::new(writer);
        writer.write_all(payload).await.map_err(map_err)?;
        writer.flush().await.map_err(map_err)
    }
}

#[async_trait]
impl ExportSink for StdioSink {
    async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport> {
        let started = Instant::now();
        let payload = to_json_lines(batch)?;

        match self.stream {
            StdStream::Stdout => self.write_all(tokio::io::stdout(), &payload).await?,
            StdStream::Stderr => self.write_all(tokio::io::stderr(), &payload).await?,
        }

        Ok(BatchReport::accepted(self.sink_type(), batch.len(), started.elapsed())
            .with_location(self.stream.name()))
    }

    fn sink_type(&self) -> &'static str {
        "stdio"
    }
}
