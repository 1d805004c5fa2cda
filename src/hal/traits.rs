// src/hal/traits.rs
//! Core HAL traits for the capture rig

use crate::hal::types::{Edge, Wait};
use std::error::Error;
use std::sync::atomic::AtomicBool;

/// Byte-oriented command channel to the sampler peripheral.
///
/// Models the two transactions the acquisition protocol needs: a single
/// command byte out, and a fixed-size block read back. Implementations
/// decide the physical transport (I2C in production, scripted buffers in
/// tests).
pub trait CommandBus {
    type Error: Error + Send + Sync + 'static;

    /// Deliver one command byte to the peripheral
    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Fill `buf` from the peripheral starting at `register`
    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// A single digital input that can be waited on for a signal edge.
///
/// `wait_for_edge` blocks until the requested edge arrives. When a cancel
/// flag is supplied the wait returns [`Wait::Cancelled`] shortly after the
/// flag is raised instead of blocking forever.
pub trait TriggerLine {
    type Error: Error + Send + Sync + 'static;

    /// Human-readable identity of the line, used in logs and errors
    fn id(&self) -> String;

    /// Block until `edge` occurs, or until `cancel` is set
    fn wait_for_edge(
        &mut self,
        edge: Edge,
        cancel: Option<&AtomicBool>,
    ) -> Result<Wait, Self::Error>;
}
