//! Data output writers

use crate::reducer::ProjectedRecord;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing projected call records
pub trait CallsWriter: OutputWriter {
    /// Write a single record
    fn write_call(&mut self, record: &ProjectedRecord) -> OutputResult<()>;

    /// Write multiple records at once
    fn write_calls(&mut self, records: &[ProjectedRecord]) -> OutputResult<()> {
        for record in records {
            self.write_call(record)?;
        }
        Ok(())
    }
}
