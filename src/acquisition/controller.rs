// src/acquisition/controller.rs
//! Trigger-gated capture state machine
//!
//! One weld cycle runs Idle → AwaitingStart → Armed → AwaitingEnd →
//! Draining and back to Idle: the falling start edge arms the peripheral,
//! the rising end edge stops it, the FIFO is drained, and exactly one record
//! is appended per completed cycle, even when the drain comes back empty.
//! An operator interrupt observed at any suspension point ends the run
//! without a partial record.

use crate::config::constants::capture;
use crate::error::{Error, Result};
use crate::hal::link::{Command, SamplerLink};
use crate::hal::traits::{CommandBus, TriggerLine};
use crate::hal::types::{CaptureRecord, Edge, Wait};
use crate::storage::CaptureLog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What to do when a start or stop command is refused by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandFailurePolicy {
    /// End the run with the error (default)
    Abort,
    /// Log the failure, skip the rest of this cycle, re-arm for the next
    NextCycle,
}

/// Capture cycle settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureSettings {
    #[serde(default = "defaults::max_samples")]
    pub max_samples: usize,

    #[serde(default = "defaults::start_settle_ms")]
    pub start_settle_ms: u64,

    #[serde(default = "defaults::stop_settle_ms")]
    pub stop_settle_ms: u64,

    #[serde(default = "defaults::on_command_failure")]
    pub on_command_failure: CommandFailurePolicy,
}

mod defaults {
    use super::CommandFailurePolicy;
    use crate::config::constants::capture;

    pub fn max_samples() -> usize { capture::DEFAULT_MAX_SAMPLES }
    pub fn start_settle_ms() -> u64 { capture::DEFAULT_START_SETTLE_MS }
    pub fn stop_settle_ms() -> u64 { capture::DEFAULT_STOP_SETTLE_MS }
    pub fn on_command_failure() -> CommandFailurePolicy { CommandFailurePolicy::Abort }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_samples: defaults::max_samples(),
            start_settle_ms: defaults::start_settle_ms(),
            stop_settle_ms: defaults::stop_settle_ms(),
            on_command_failure: defaults::on_command_failure(),
        }
    }
}

impl CaptureSettings {
    /// Post-start-command settle delay
    pub fn start_settle(&self) -> Duration {
        Duration::from_millis(self.start_settle_ms)
    }

    /// Post-stop-command settle delay
    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle_ms)
    }
}

/// Where in the capture cycle the controller currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    AwaitingStart,
    Armed,
    AwaitingEnd,
    Draining,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "idle"),
            CyclePhase::AwaitingStart => write!(f, "awaiting-start"),
            CyclePhase::Armed => write!(f, "armed"),
            CyclePhase::AwaitingEnd => write!(f, "awaiting-end"),
            CyclePhase::Draining => write!(f, "draining"),
        }
    }
}

/// How a single cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion and its record was persisted
    Completed { record: CaptureRecord },
    /// A shutdown request ended the cycle before completion; nothing was
    /// persisted for it
    Interrupted,
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub samples: u64,
}

/// Drives trigger waits, the command handshake, the FIFO drain, and record
/// persistence for cycle after cycle.
pub struct AcquisitionController<B: CommandBus, T: TriggerLine> {
    link: SamplerLink<B>,
    start: T,
    end: T,
    store: CaptureLog,
    settings: CaptureSettings,
    phase: CyclePhase,
    cancel: Arc<AtomicBool>,
    cycles: u64,
    samples: u64,
}

impl<B: CommandBus, T: TriggerLine> AcquisitionController<B, T> {
    /// Build a controller over an already-opened rig.
    ///
    /// `start` and `end` may be waits on the same physical line; the
    /// controller only ever waits on one of them at a time.
    pub fn new(
        bus: B,
        start: T,
        end: T,
        store: CaptureLog,
        settings: CaptureSettings,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            link: SamplerLink::new(bus),
            start,
            end,
            store,
            settings,
            phase: CyclePhase::Idle,
            cancel,
            cycles: 0,
            samples: 0,
        }
    }

    /// Current phase of the cycle state machine
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Completed cycles so far
    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    /// Run one full capture cycle.
    ///
    /// Blocks on the start trigger, arms the peripheral, blocks on the end
    /// trigger, stops it, drains the FIFO, and appends the record. Trigger
    /// and storage failures, and command failures too, surface as errors;
    /// the caller applies [`CommandFailurePolicy`].
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.set_phase(CyclePhase::AwaitingStart);
        log::info!("waiting for start trigger on {}", self.start.id());
        if self.wait_on_start()? == Wait::Cancelled {
            self.set_phase(CyclePhase::Idle);
            return Ok(CycleOutcome::Interrupted);
        }
        log::info!("start trigger hit; arming sampler");

        self.send(Command::Start)?;
        self.set_phase(CyclePhase::Armed);
        // Give the peripheral time to act on the command before the end
        // trigger can fire
        thread::sleep(self.settings.start_settle());

        self.set_phase(CyclePhase::AwaitingEnd);
        log::info!("waiting for end trigger on {}", self.end.id());
        if self.wait_on_end()? == Wait::Cancelled {
            self.set_phase(CyclePhase::Idle);
            return Ok(CycleOutcome::Interrupted);
        }
        log::info!("end trigger hit; stopping sampler");

        self.send(Command::Stop)?;
        // The peripheral needs a moment to finalize its buffer before the
        // drain starts
        thread::sleep(self.settings.stop_settle());

        self.set_phase(CyclePhase::Draining);
        log::info!("collecting samples");
        let max = self.settings.max_samples.min(capture::MAX_SAMPLE_CAP);
        let samples = self.link.read_samples(max);

        let record = CaptureRecord::now(samples);
        self.store.append(&record)?;

        self.cycles += 1;
        self.samples += record.len() as u64;
        log::info!("cycle {} complete: {} samples saved", self.cycles, record.len());
        self.set_phase(CyclePhase::Idle);
        Ok(CycleOutcome::Completed { record })
    }

    /// Run cycles until a shutdown is requested or a fatal error occurs
    pub fn run(&mut self) -> Result<RunSummary> {
        log::info!("acquisition loop started");
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
            match self.run_cycle() {
                Ok(CycleOutcome::Completed { .. }) => {}
                Ok(CycleOutcome::Interrupted) => break,
                Err(err @ Error::Command { .. })
                    if self.settings.on_command_failure == CommandFailurePolicy::NextCycle =>
                {
                    log::warn!("{err}; abandoning this cycle and re-arming");
                }
                Err(err) => return Err(err),
            }
        }
        let summary = RunSummary {
            cycles: self.cycles,
            samples: self.samples,
        };
        log::info!(
            "acquisition loop stopped after {} cycles ({} samples)",
            summary.cycles,
            summary.samples
        );
        Ok(summary)
    }

    fn wait_on_start(&mut self) -> Result<Wait> {
        let wait = self
            .start
            .wait_for_edge(Edge::Falling, Some(self.cancel.as_ref()));
        wait.map_err(|source| Error::TriggerWait {
            line: self.start.id(),
            edge: Edge::Falling,
            source: Box::new(source),
        })
    }

    fn wait_on_end(&mut self) -> Result<Wait> {
        let wait = self
            .end
            .wait_for_edge(Edge::Rising, Some(self.cancel.as_ref()));
        wait.map_err(|source| Error::TriggerWait {
            line: self.end.id(),
            edge: Edge::Rising,
            source: Box::new(source),
        })
    }

    fn send(&mut self, command: Command) -> Result<()> {
        self.link
            .send_command(command)
            .map_err(|source| Error::Command {
                command,
                source: Box::new(source),
            })
    }

    fn set_phase(&mut self, phase: CyclePhase) {
        if self.phase != phase {
            log::debug!("phase {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }
}
