//! Trace persistence (Parquet)
//!
//! Traces are written as a single Parquet file carrying the trace schema, so
//! a sampling run can be re-estimated or plotted offline.

use super::Trace;
use crate::{Error, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;

impl Trace {
    /// Write the trace to a Parquet file, replacing any existing file.
    ///
    /// # Errors
    /// Returns error if the file cannot be created or written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet file: {e}"))
        })?;

        let mut writer = ArrowWriter::try_new(file, self.as_record_batch().schema(), None)?;
        writer.write(self.as_record_batch())?;
        writer.close()?;

        tracing::debug!(
            path = %path.as_ref().display(),
            records = self.len(),
            "trace written"
        );
        Ok(())
    }

    /// Load a trace from a Parquet file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or does not carry the
    /// trace schema
    pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut traces = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            traces.push(Self::from_record_batch(batch)?);
        }

        Self::concat(&traces)
    }
}
