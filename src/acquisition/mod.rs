// src/acquisition/mod.rs
//! Trigger-gated capture cycles

pub mod controller;

pub use controller::*;
