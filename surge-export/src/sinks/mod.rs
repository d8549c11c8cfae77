//! Reference export sinks

pub mod file;
pub mod http;
pub mod memory;
pub mod stdio;

pub use file::{FileSink, FileSinkConfig};
pub use http::{HttpSink, HttpSinkConfig};
pub use memory::MemorySink;
pub use stdio::{StdStream, StdioSink};

use crate::error::ExportResult;
use crate::sink::ExportDocument;

/// Encode a batch as JSON lines, one document per line
pub(crate) fn to_json_lines(batch: &[ExportDocument]) -> ExportResult<Vec<u8>> {
    let mut buffer = Vec::new();
    for document in batch {
        serde_json::to_writer(&mut buffer, document)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}
