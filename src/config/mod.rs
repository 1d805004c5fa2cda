// src/config/mod.rs
//! Configuration for the capture rig

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::acquisition::CaptureSettings;
use crate::hal::LineBias;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete system configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub bus: BusSettings,

    #[serde(default)]
    pub triggers: TriggerSettings,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Command bus settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusSettings {
    #[serde(default = "defaults::bus_device")]
    pub device: PathBuf,

    #[serde(default = "defaults::peripheral_address")]
    pub address: u16,
}

/// Trigger line settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerSettings {
    #[serde(default = "defaults::gpio_chip")]
    pub chip: PathBuf,

    #[serde(default = "defaults::start_line")]
    pub start_line: u32,

    #[serde(default = "defaults::end_line")]
    pub end_line: u32,

    #[serde(default = "defaults::bias")]
    pub bias: LineBias,

    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Record storage settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "defaults::log_path")]
    pub path: PathBuf,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::hal::LineBias;
    use std::path::PathBuf;

    pub fn bus_device() -> PathBuf { PathBuf::from(bus::DEFAULT_I2C_DEVICE) }
    pub fn peripheral_address() -> u16 { bus::DEFAULT_PERIPHERAL_ADDRESS }

    pub fn gpio_chip() -> PathBuf { PathBuf::from(trigger::DEFAULT_GPIO_CHIP) }
    pub fn start_line() -> u32 { trigger::DEFAULT_START_LINE }
    pub fn end_line() -> u32 { trigger::DEFAULT_END_LINE }
    pub fn bias() -> LineBias { LineBias::PullUp }
    pub fn poll_interval_ms() -> u64 { trigger::DEFAULT_POLL_INTERVAL_MS }

    pub fn log_path() -> PathBuf { PathBuf::from(storage::DEFAULT_LOG_PATH) }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            device: defaults::bus_device(),
            address: defaults::peripheral_address(),
        }
    }
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            chip: defaults::gpio_chip(),
            start_line: defaults::start_line(),
            end_line: defaults::end_line(),
            bias: defaults::bias(),
            poll_interval_ms: defaults::poll_interval_ms(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: defaults::log_path(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bus: BusSettings::default(),
            triggers: TriggerSettings::default(),
            capture: CaptureSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl TriggerSettings {
    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SystemConfig {
    /// Reject configurations that could not possibly drive the rig
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.address < bus::MIN_PERIPHERAL_ADDRESS
            || self.bus.address > bus::MAX_PERIPHERAL_ADDRESS
        {
            return Err(ConfigError::Invalid {
                field: "bus.address",
                reason: format!(
                    "0x{:02X} is outside the valid 7-bit range 0x{:02X}..=0x{:02X}",
                    self.bus.address,
                    bus::MIN_PERIPHERAL_ADDRESS,
                    bus::MAX_PERIPHERAL_ADDRESS
                ),
            });
        }
        if self.triggers.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "triggers.poll_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.capture.max_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "capture.max_samples",
                reason: "a cycle must be allowed at least one sample".to_string(),
            });
        }
        if self.capture.max_samples > capture::MAX_SAMPLE_CAP {
            return Err(ConfigError::Invalid {
                field: "capture.max_samples",
                reason: format!("{} exceeds the cap of {}", self.capture.max_samples, capture::MAX_SAMPLE_CAP),
            });
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.path",
                reason: "log path must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// One-line description of the loaded setup, for startup logging
    pub fn summary(&self) -> String {
        format!(
            "bus {} @0x{:02X}, start line {}:{}, end line {}:{}, max {} samples/cycle, log {}",
            self.bus.device.display(),
            self.bus.address,
            self.triggers.chip.display(),
            self.triggers.start_line,
            self.triggers.chip.display(),
            self.triggers.end_line,
            self.capture.max_samples,
            self.storage.path.display()
        )
    }
}
