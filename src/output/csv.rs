//! CSV output writer for projected call records

use crate::reducer::ProjectedRecord;
use csv::Writer;
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{CallsWriter, OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Flush every N records
const FLUSH_INTERVAL: u64 = 1000;

/// CSV writer for call records
///
/// The header is written when the writer is created, so an export with no
/// calls still produces a header-only file.
pub struct CsvCallsWriter {
    writer: Writer<BufWriter<File>>,
    header: Vec<String>,
    records_written: u64,
}

impl CsvCallsWriter {
    /// Create (or truncate) `path` and write the header row
    pub fn new<P: AsRef<Path>>(path: P, header: Vec<String>) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, header, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with a custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        header: Vec<String>,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let mut writer = Writer::from_writer(buf_writer);

        writer
            .write_record(&header)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        debug!(columns = header.len(), "CSV header written");

        Ok(Self {
            writer,
            header,
            records_written: 0,
        })
    }

    /// Number of data rows written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Column names in order
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

/// Render a JSON value as a CSV cell
///
/// Strings are written raw, null as an empty cell, and nested values as
/// compact JSON.
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl CallsWriter for CsvCallsWriter {
    fn write_call(&mut self, record: &ProjectedRecord) -> OutputResult<()> {
        let row: Vec<String> = self
            .header
            .iter()
            .map(|column| render_cell(record.get(column)))
            .collect();

        self.writer
            .write_record(&row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write call: {}", e)))?;

        self.records_written += 1;

        if self.records_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} calls written", self.records_written);
        }

        Ok(())
    }
}

impl OutputWriter for CsvCallsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV writer: {} total calls written", self.records_written);

        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!("CSV writer closed successfully: {} calls written", self.records_written);
        Ok(())
    }
}

/// Write `records` under `header` to `path`, overwriting any existing file
pub fn write_calls_csv<P: AsRef<Path>>(
    path: P,
    header: Vec<String>,
    records: &[ProjectedRecord],
) -> OutputResult<u64> {
    let mut writer = CsvCallsWriter::new(path, header)?;
    writer.write_calls(records)?;
    let written = writer.records_written();
    writer.close()?;
    Ok(written)
}
