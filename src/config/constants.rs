// src/config/constants.rs
//! System-wide configuration constants

/// Command bus constants
pub mod bus {
    /// Adapter the sampler peripheral hangs off on the deployed rig
    pub const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-7";
    /// 7-bit address the sampler firmware answers on
    pub const DEFAULT_PERIPHERAL_ADDRESS: u16 = 0x08;

    // Valid 7-bit address window; below 0x08 and above 0x77 are reserved
    pub const MIN_PERIPHERAL_ADDRESS: u16 = 0x08;
    pub const MAX_PERIPHERAL_ADDRESS: u16 = 0x77;
}

/// Trigger line constants
pub mod trigger {
    pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
    pub const DEFAULT_START_LINE: u32 = 12;
    pub const DEFAULT_END_LINE: u32 = 12;
    /// How often a blocked edge wait checks for a shutdown request
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
    pub const CONSUMER_LABEL: &str = "weldlog";
}

/// Capture cycle constants
pub mod capture {
    /// Upper bound on samples drained per cycle
    pub const DEFAULT_MAX_SAMPLES: usize = 5000;
    /// Ceiling on the configurable cap; anything larger is a typo
    pub const MAX_SAMPLE_CAP: usize = 1_000_000;
    /// Pause after the start command before the end trigger is watched
    pub const DEFAULT_START_SETTLE_MS: u64 = 10;
    /// Pause after the stop command before the drain starts, letting the
    /// peripheral finalize its buffer
    pub const DEFAULT_STOP_SETTLE_MS: u64 = 50;
}

/// Record storage constants
pub mod storage {
    pub const DEFAULT_LOG_PATH: &str = "data_log.csv";
}

/// Simulator constants
pub mod simulation {
    /// Slice length for interruptible simulated waits
    pub const SLEEP_SLICE_MS: u64 = 10;
    /// Samples per synthetic weld-current hump
    pub const SAMPLES_PER_HUMP: usize = 50;
    /// Resting level of the synthetic trace, in ADC counts
    pub const BASELINE_COUNTS: u16 = 512;
    /// Peak excursion above baseline, in ADC counts
    pub const PEAK_SWING_COUNTS: u16 = 3000;
    /// Default burst size served per simulated cycle
    pub const DEFAULT_BURST_LEN: usize = 400;
    /// Default spacing of simulated trigger edges
    pub const DEFAULT_EDGE_PERIOD_MS: u64 = 250;
}

/// Configuration file locations
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/weldlog/config.toml";
    pub const DEFAULT_CONFIG_FILE: &str = "config/weldlog.toml";
    pub const LOCAL_CONFIG_FILE: &str = "weldlog.toml";
    pub const ENV_PREFIX: &str = "WELDLOG";
    /// Joins the prefix to the first key segment: `WELDLOG_BUS__ADDRESS`
    pub const ENV_PREFIX_SEPARATOR: &str = "_";
    /// Separates nested key segments within a variable name
    pub const ENV_SEPARATOR: &str = "__";
}
