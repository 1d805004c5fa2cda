// src/hal/mod.rs
//! Hardware Abstraction Layer for the capture rig

pub mod traits;
pub mod types;
pub mod link;
pub mod simulator;
#[cfg(feature = "hardware")]
pub mod cdev;

#[cfg(test)]
mod tests;

pub use traits::*;
pub use types::*;
