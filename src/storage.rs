// src/storage.rs
//! Append-only CSV log of capture records
//!
//! Durability beats throughput here: every append opens the file, writes one
//! row, flushes, and closes, so a completed weld cycle survives whatever
//! happens to the process afterwards. The header row is written only when
//! the file is empty, which keeps restarts from scattering headers through
//! an existing log.

use crate::hal::types::CaptureRecord;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Header row; the sample count varies per record so there is one label
/// covering all sample columns.
pub const HEADER: [&str; 2] = ["Timestamp", "Samples..."];

/// Timestamp column format, local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Failures raised while persisting records
#[derive(Debug, Error)]
pub enum StorageError {
    /// The log file could not be opened or created
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The header row could not be written to a fresh log
    #[error("failed to write header to {path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// A record row could not be written
    #[error("failed to append record to {path}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// Buffered rows could not be pushed to disk
    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle on the capture log file
#[derive(Debug, Clone)]
pub struct CaptureLog {
    path: PathBuf,
}

impl CaptureLog {
    /// Open (creating if needed) the log at `path` and make sure it carries
    /// the header row. Fails here rather than mid-run if the path is not
    /// writable.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let log = Self { path: path.into() };
        let file = log.open_for_append()?;
        let mut writer = log.write_header_if_empty(file)?;
        writer.flush().map_err(|source| StorageError::Flush {
            path: log.path.clone(),
            source,
        })?;
        log::info!("capture log ready at {}", log.path.display());
        Ok(log)
    }

    /// Append one record as a single CSV row and flush it to disk.
    ///
    /// The file is reopened for every record. The header check repeats on
    /// each append so a log file removed or truncated between cycles grows a
    /// fresh header instead of silently losing it.
    pub fn append(&self, record: &CaptureRecord) -> Result<(), StorageError> {
        let file = self.open_for_append()?;
        let mut writer = self.write_header_if_empty(file)?;

        let mut row = Vec::with_capacity(1 + record.samples.len());
        row.push(record.timestamp.format(TIMESTAMP_FORMAT).to_string());
        row.extend(record.samples.iter().map(|s| s.to_string()));
        writer.write_record(&row).map_err(|source| StorageError::Append {
            path: self.path.clone(),
            source,
        })?;

        writer.flush().map_err(|source| StorageError::Flush {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    fn open_for_append(&self) -> Result<File, StorageError> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|source| StorageError::Open {
                path: self.path.clone(),
                source,
            })
    }

    /// Wrap `file` in a CSV writer, emitting the header first when the file
    /// has no content yet. Rows have varying widths, hence the flexible
    /// writer.
    fn write_header_if_empty(&self, file: File) -> Result<csv::Writer<File>, StorageError> {
        let empty = file.metadata().map(|m| m.len() == 0).unwrap_or(false);
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        if empty {
            writer.write_record(HEADER).map_err(|source| StorageError::Header {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(writer)
    }
}
