//! Weldlog: trigger-gated weld cycle data acquisition
//!
//! This library captures per-cycle sample bursts from a welding current
//! sampler and persists them as append-only CSV records. It provides:
//!
//! - Hardware abstraction for the command bus and the trigger lines
//! - A capture state machine gating acquisition on start/end trigger edges
//! - Durable one-row-per-cycle CSV storage
//! - Layered configuration with environment overrides
//! - A scripted simulator for desk runs and tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use weldlog::acquisition::{AcquisitionController, CaptureSettings};
//! use weldlog::hal::simulator::{SimBus, SimTrigger, SimWait};
//! use weldlog::storage::CaptureLog;
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! fn main() -> weldlog::Result<()> {
//!     let store = CaptureLog::open("data_log.csv")?;
//!     let cancel = Arc::new(AtomicBool::new(false));
//!
//!     let mut controller = AcquisitionController::new(
//!         SimBus::generating(400),
//!         SimTrigger::scripted("start", [SimWait::Now]),
//!         SimTrigger::scripted("end", [SimWait::Now]),
//!         store,
//!         CaptureSettings::default(),
//!         cancel,
//!     );
//!
//!     let summary = controller.run()?;
//!     println!("{} cycles captured", summary.cycles);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod hal;
pub mod storage;

// Re-export commonly used types for convenience
pub use acquisition::{
    AcquisitionController, CaptureSettings, CommandFailurePolicy, CycleOutcome, CyclePhase,
    RunSummary,
};
pub use error::{BoxError, Error, Result};
pub use hal::link::{Command, SamplerLink};
pub use hal::{CaptureRecord, CommandBus, Edge, LineBias, Sample, TriggerLine, Wait};
pub use storage::{CaptureLog, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
