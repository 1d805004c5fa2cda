// src/hal/link.rs
//! Command-and-drain protocol driver for the sampler peripheral
//!
//! The peripheral understands two single-byte commands and answers block
//! reads with one little-endian 16-bit sample per transaction. A read
//! failure is how the peripheral signals it has nothing more to say, so the
//! drain loop treats the first failed read as end-of-burst rather than an
//! error.

use crate::hal::traits::CommandBus;
use crate::hal::types::Sample;
use std::fmt;

/// Command bytes understood by the sampler firmware
mod cmd {
    pub const START: u8 = b'S';
    pub const STOP: u8 = b'E';
}

/// Register the sampler serves its FIFO from
pub const SAMPLE_REGISTER: u8 = 0x00;

/// Wire size of one sample
pub const SAMPLE_BYTES: usize = 2;

/// Capture commands accepted by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin buffering samples
    Start,
    /// Stop buffering and prepare the FIFO for draining
    Stop,
}

impl Command {
    /// Byte sent on the wire for this command
    pub const fn byte(self) -> u8 {
        match self {
            Command::Start => cmd::START,
            Command::Stop => cmd::STOP,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
        }
    }
}

/// Protocol driver over any [`CommandBus`] transport
#[derive(Debug)]
pub struct SamplerLink<B: CommandBus> {
    bus: B,
}

impl<B: CommandBus> SamplerLink<B> {
    /// Drive the protocol over `bus`
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Deliver a capture command to the peripheral
    pub fn send_command(&mut self, command: Command) -> Result<(), B::Error> {
        log::debug!("sending {command} command (0x{:02X})", command.byte());
        self.bus.write_byte(command.byte())
    }

    /// Drain buffered samples, at most `max_count` of them.
    ///
    /// Each sample costs one block read. The drain ends at `max_count` or at
    /// the first read failure, whichever comes first; the failure itself is
    /// swallowed because an exhausted FIFO reports as a bus error. Returns
    /// whatever arrived intact, possibly nothing.
    pub fn read_samples(&mut self, max_count: usize) -> Vec<Sample> {
        let mut samples = Vec::new();
        let mut buf = [0u8; SAMPLE_BYTES];
        for _ in 0..max_count {
            match self.bus.read_block(SAMPLE_REGISTER, &mut buf) {
                Ok(()) => samples.push(Sample::from_le_bytes(buf)),
                Err(err) => {
                    log::debug!("drain stopped after {} samples: {err}", samples.len());
                    break;
                }
            }
        }
        samples
    }

    /// Access the underlying transport
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}
