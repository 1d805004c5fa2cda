// src/hal/simulator.rs
//! Scripted stand-ins for the capture hardware
//!
//! `SimBus` and `SimTrigger` let the whole acquisition path run on a desk:
//! the bus serves a canned (or synthesized) sample burst and then starts
//! failing its reads the way a drained FIFO does, and the trigger plays back
//! a scripted sequence of edge arrivals. Both keep journals so tests can
//! assert what the controller actually asked for.

use crate::config::constants::simulation;
use crate::hal::link::Command;
use crate::hal::traits::{CommandBus, TriggerLine};
use crate::hal::types::{Edge, Sample, Wait};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Bus faults the simulator can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimBusError {
    /// No samples left to serve; mimics the NAK a drained peripheral returns
    #[error("simulated FIFO exhausted")]
    Exhausted,
    /// Scripted command-write failure
    #[error("simulated peripheral refused command 0x{0:02X}")]
    CommandRefused(u8),
}

/// Scripted [`CommandBus`] serving bursts of samples from memory
#[derive(Debug)]
pub struct SimBus {
    pending: VecDeque<Sample>,
    replenish: Option<usize>,
    commands: Arc<Mutex<Vec<u8>>>,
    refuse_commands: bool,
}

impl SimBus {
    /// Bus that will serve exactly `samples`, then fail further reads
    pub fn with_samples<I: IntoIterator<Item = Sample>>(samples: I) -> Self {
        Self {
            pending: samples.into_iter().collect(),
            replenish: None,
            commands: Arc::new(Mutex::new(Vec::new())),
            refuse_commands: false,
        }
    }

    /// Bus that buffers a fresh synthesized burst of `count` samples on every
    /// start command, the way the peripheral firmware re-arms its FIFO
    pub fn generating(count: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            replenish: Some(count),
            commands: Arc::new(Mutex::new(Vec::new())),
            refuse_commands: false,
        }
    }

    /// Make every command write fail with [`SimBusError::CommandRefused`]
    pub fn refusing_commands(mut self) -> Self {
        self.refuse_commands = true;
        self
    }

    /// Handle onto the journal of command bytes received so far
    pub fn command_journal(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.commands)
    }

    /// Samples still waiting to be served
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl CommandBus for SimBus {
    type Error = SimBusError;

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        if self.refuse_commands {
            return Err(SimBusError::CommandRefused(value));
        }
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(value);
        if value == Command::Start.byte() {
            if let Some(count) = self.replenish {
                self.pending = synthetic_burst(count).into();
            }
        }
        Ok(())
    }

    fn read_block(&mut self, _register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let sample = self.pending.pop_front().ok_or(SimBusError::Exhausted)?;
        let bytes = sample.to_le_bytes();
        let len = buf.len().min(bytes.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok(())
    }
}

/// One step in a trigger script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimWait {
    /// Edge arrives immediately
    Now,
    /// Edge arrives after the given delay
    After(Duration),
    /// Wait ends as if the operator had interrupted it
    Cancelled,
}

/// Record of one edge wait observed by a [`SimTrigger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRecord {
    pub line: String,
    pub edge: Edge,
}

#[derive(Debug)]
enum TriggerMode {
    Scripted(VecDeque<SimWait>),
    Periodic(Duration),
}

/// Scripted [`TriggerLine`] that journals every wait placed on it
#[derive(Debug)]
pub struct SimTrigger {
    name: String,
    mode: TriggerMode,
    waits: Arc<Mutex<Vec<WaitRecord>>>,
}

impl SimTrigger {
    /// Trigger that plays back `script` one wait at a time. A wait past the
    /// end of the script reports [`Wait::Cancelled`], which winds down a run
    /// loop cleanly once the scripted cycles are spent.
    pub fn scripted<I: IntoIterator<Item = SimWait>>(name: &str, script: I) -> Self {
        Self {
            name: name.to_string(),
            mode: TriggerMode::Scripted(script.into_iter().collect()),
            waits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Trigger whose edge arrives `period` after every wait begins
    pub fn periodic(name: &str, period: Duration) -> Self {
        Self {
            name: name.to_string(),
            mode: TriggerMode::Periodic(period),
            waits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle onto the journal of waits placed on this line
    pub fn wait_journal(&self) -> Arc<Mutex<Vec<WaitRecord>>> {
        Arc::clone(&self.waits)
    }

    /// Sleep in short slices so a raised cancel flag is noticed promptly
    fn interruptible_sleep(total: Duration, cancel: Option<&AtomicBool>) -> Wait {
        let slice = Duration::from_millis(simulation::SLEEP_SLICE_MS);
        let mut remaining = total;
        while !remaining.is_zero() {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Wait::Cancelled;
                }
            }
            let step = remaining.min(slice);
            thread::sleep(step);
            remaining -= step;
        }
        Wait::Edge
    }
}

impl TriggerLine for SimTrigger {
    type Error = std::convert::Infallible;

    fn id(&self) -> String {
        self.name.clone()
    }

    fn wait_for_edge(
        &mut self,
        edge: Edge,
        cancel: Option<&AtomicBool>,
    ) -> Result<Wait, Self::Error> {
        self.waits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(WaitRecord {
                line: self.name.clone(),
                edge,
            });

        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                return Ok(Wait::Cancelled);
            }
        }

        let outcome = match &mut self.mode {
            TriggerMode::Scripted(script) => match script.pop_front() {
                Some(SimWait::Now) => Wait::Edge,
                Some(SimWait::After(delay)) => Self::interruptible_sleep(delay, cancel),
                Some(SimWait::Cancelled) | None => Wait::Cancelled,
            },
            TriggerMode::Periodic(period) => Self::interruptible_sleep(*period, cancel),
        };
        Ok(outcome)
    }
}

/// Deterministic synthetic weld-current trace: repeated half-sine humps over
/// a resting baseline, scaled into the 12-bit range the real ADC produces.
pub fn synthetic_burst(count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| {
            let phase = (i % simulation::SAMPLES_PER_HUMP) as f32
                / simulation::SAMPLES_PER_HUMP as f32;
            let hump = (phase * std::f32::consts::PI).sin();
            simulation::BASELINE_COUNTS + (hump * simulation::PEAK_SWING_COUNTS as f32) as Sample
        })
        .collect()
}
