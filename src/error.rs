// src/error.rs
//! Unified error type for the capture rig
//!
//! Backend errors stay behind the HAL traits' associated `Error` types; the
//! acquisition layer boxes them into this enum so a run loop has one failure
//! currency regardless of which transport it was built over.

use crate::config::ConfigError;
use crate::hal::link::Command;
use crate::hal::Edge;
use crate::storage::StorageError;
use thiserror::Error;

/// Boxed backend error, whatever transport produced it
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error for acquisition runs
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A trigger line could not be claimed at startup
    #[error("trigger line {line} failed to set up: {source}")]
    TriggerSetup {
        line: String,
        #[source]
        source: BoxError,
    },

    /// An edge wait failed at the GPIO layer
    #[error("waiting for {edge} edge on {line} failed: {source}")]
    TriggerWait {
        line: String,
        edge: Edge,
        #[source]
        source: BoxError,
    },

    /// A command byte could not be delivered to the peripheral
    #[error("{command} command failed: {source}")]
    Command {
        command: Command,
        #[source]
        source: BoxError,
    },

    /// Record store open or append failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Real-hardware run requested from a build without the backends
    #[error("hardware support not compiled in; rebuild with the `hardware` feature or run with --simulate")]
    HardwareSupportDisabled,
}

/// Result alias for acquisition operations
pub type Result<T> = std::result::Result<T, Error>;
