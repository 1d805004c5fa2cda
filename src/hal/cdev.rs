// src/hal/cdev.rs
//! Linux character-device backends: I2C command bus and GPIO trigger lines
//!
//! `LinuxI2cBus` talks SMBus through `/dev/i2c-*`; `CdevTrigger` waits on
//! GPIO edges through `/dev/gpiochip*`. Each edge wait owns its line request
//! for the duration of that wait only, so a rig wired with the start and end
//! triggers on the same physical line still works: the two waits happen in
//! sequence and never hold conflicting claims.

use crate::hal::traits::{CommandBus, TriggerLine};
use crate::hal::types::{Edge, LineBias, Wait};
use gpiocdev::line::{Bias, EdgeDetection};
use gpiocdev::Request;
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Failures raised by the I2C transport
#[derive(Debug, Error)]
pub enum I2cBusError {
    /// The kernel i2c layer rejected or aborted the transfer
    #[error("i2c transfer failed: {0}")]
    Transfer(#[from] LinuxI2CError),
    /// The peripheral answered with fewer bytes than the protocol requires
    #[error("short block read: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },
}

/// SMBus transport to the sampler peripheral
pub struct LinuxI2cBus {
    device: LinuxI2CDevice,
}

impl LinuxI2cBus {
    /// Open the adapter at `path` and address the peripheral at `address`
    pub fn open(path: &Path, address: u16) -> Result<Self, I2cBusError> {
        let device = LinuxI2CDevice::new(path, address)?;
        log::info!("opened i2c bus {} (peripheral 0x{address:02X})", path.display());
        Ok(Self { device })
    }
}

impl CommandBus for LinuxI2cBus {
    type Error = I2cBusError;

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        self.device.smbus_write_byte(value)?;
        Ok(())
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let data = self.device.smbus_read_i2c_block_data(register, buf.len() as u8)?;
        if data.len() < buf.len() {
            return Err(I2cBusError::ShortRead {
                wanted: buf.len(),
                got: data.len(),
            });
        }
        buf.copy_from_slice(&data[..buf.len()]);
        Ok(())
    }
}

/// GPIO trigger input backed by the kernel character device
#[derive(Debug, Clone)]
pub struct CdevTrigger {
    chip: PathBuf,
    offset: u32,
    bias: LineBias,
    consumer: String,
    poll_interval: Duration,
}

impl CdevTrigger {
    /// Claim `offset` on `chip` as a biased input and verify it is readable.
    ///
    /// The open-time request is dropped before returning; waits re-request
    /// the line with edge detection armed, so detection starts when the wait
    /// starts rather than at configuration time.
    pub fn open(
        chip: &Path,
        offset: u32,
        bias: LineBias,
        consumer: &str,
        poll_interval: Duration,
    ) -> Result<Self, gpiocdev::Error> {
        let line = Self {
            chip: chip.to_path_buf(),
            offset,
            bias,
            consumer: consumer.to_string(),
            poll_interval,
        };
        let request = line.input_request(None)?;
        let level = request.value(offset)?;
        log::info!(
            "trigger line {} ready (bias {:?}, level {:?})",
            line.id(),
            bias,
            level
        );
        Ok(line)
    }

    /// Current level of the line, via a transient input claim
    pub fn read_level(&self) -> Result<gpiocdev::line::Value, gpiocdev::Error> {
        let req = self.input_request(None)?;
        req.value(self.offset)
    }

    fn input_request(&self, edge: Option<EdgeDetection>) -> Result<Request, gpiocdev::Error> {
        let mut builder = Request::builder();
        builder
            .on_chip(&self.chip)
            .with_consumer(self.consumer.as_str())
            .with_line(self.offset)
            .as_input()
            .with_bias(bias_flag(self.bias));
        if let Some(detection) = edge {
            builder.with_edge_detection(detection);
        }
        builder.request()
    }
}

impl TriggerLine for CdevTrigger {
    type Error = gpiocdev::Error;

    fn id(&self) -> String {
        format!("{}:{}", self.chip.display(), self.offset)
    }

    fn wait_for_edge(
        &mut self,
        edge: Edge,
        cancel: Option<&AtomicBool>,
    ) -> Result<Wait, Self::Error> {
        let detection = match edge {
            Edge::Rising => EdgeDetection::RisingEdge,
            Edge::Falling => EdgeDetection::FallingEdge,
        };
        let req = self.input_request(Some(detection))?;
        log::debug!("waiting for {edge} edge on {}", self.id());

        // Sliced waits on one persistent request: edges arriving between
        // slices stay queued in the kernel event buffer, so none are lost
        // while the cancel flag is checked.
        loop {
            if req.wait_edge_event(self.poll_interval)? {
                let event = req.read_edge_event()?;
                log::debug!("{edge} edge on {} at {}ns", self.id(), event.timestamp_ns);
                return Ok(Wait::Edge);
            }
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Ok(Wait::Cancelled);
                }
            }
        }
    }
}

fn bias_flag(bias: LineBias) -> Bias {
    match bias {
        LineBias::PullUp => Bias::PullUp,
        LineBias::PullDown => Bias::PullDown,
        LineBias::Disabled => Bias::Disabled,
    }
}
