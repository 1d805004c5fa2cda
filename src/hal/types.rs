// src/hal/types.rs
//! Core types shared by the capture hardware abstraction

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single ADC reading as delivered by the sampler peripheral
pub type Sample = u16;

/// One weld cycle's worth of data: a wall-clock stamp taken at the end
/// trigger plus every sample drained from the peripheral for that cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub timestamp: DateTime<Local>,
    pub samples: Vec<Sample>,
}

/// Signal transition direction on a trigger line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Outcome of a blocking edge wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// The requested edge arrived
    Edge,
    /// The wait was abandoned because a shutdown was requested
    Cancelled,
}

/// Internal bias applied to a trigger input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineBias {
    PullUp,
    PullDown,
    Disabled,
}

impl CaptureRecord {
    /// Record with an explicit timestamp
    pub fn new(timestamp: DateTime<Local>, samples: Vec<Sample>) -> Self {
        Self { timestamp, samples }
    }

    /// Record stamped with the current local time
    pub fn now(samples: Vec<Sample>) -> Self {
        Self::new(Local::now(), samples)
    }

    /// True when the drain came back with nothing
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples captured this cycle
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Rising => write!(f, "rising"),
            Edge::Falling => write!(f, "falling"),
        }
    }
}

impl Default for LineBias {
    fn default() -> Self {
        LineBias::PullUp
    }
}
