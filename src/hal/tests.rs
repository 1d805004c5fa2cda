// src/hal/tests.rs
//! Unit tests for HAL components

use crate::hal::link::{Command, SamplerLink, SAMPLE_BYTES};
use crate::hal::simulator::SimBus;
use crate::hal::traits::CommandBus;
use crate::hal::types::Sample;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("scripted read fault")]
struct ScriptedFault;

/// Bus serving raw pre-encoded frames, with faults at scripted positions
struct FrameBus {
    frames: VecDeque<Result<[u8; SAMPLE_BYTES], ScriptedFault>>,
}

impl FrameBus {
    fn new<I: IntoIterator<Item = Result<[u8; SAMPLE_BYTES], ScriptedFault>>>(frames: I) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl CommandBus for FrameBus {
    type Error = ScriptedFault;

    fn write_byte(&mut self, _value: u8) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_block(&mut self, _register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        match self.frames.pop_front() {
            Some(Ok(frame)) => {
                buf.copy_from_slice(&frame);
                Ok(())
            }
            Some(Err(fault)) => Err(fault),
            None => Err(ScriptedFault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_command_bytes_match_wire_protocol() {
        assert_eq!(Command::Start.byte(), b'S');
        assert_eq!(Command::Stop.byte(), b'E');
    }

    #[test]
    fn test_samples_decode_little_endian() {
        let bus = FrameBus::new([Ok([0x34, 0x12]), Ok([0xFF, 0x0F])]);
        let mut link = SamplerLink::new(bus);

        assert_eq!(link.read_samples(10), vec![0x1234, 0x0FFF]);
    }

    #[test]
    fn test_drain_stops_at_first_read_fault_and_keeps_prefix() {
        // A good frame after the fault must not be picked up
        let bus = FrameBus::new([
            Ok([0x01, 0x00]),
            Ok([0x02, 0x00]),
            Err(ScriptedFault),
            Ok([0x03, 0x00]),
        ]);
        let mut link = SamplerLink::new(bus);

        assert_eq!(link.read_samples(10), vec![1, 2]);
    }

    #[test]
    fn test_drain_respects_sample_cap() {
        let mut link = SamplerLink::new(SimBus::with_samples(0..100u16));

        assert_eq!(link.read_samples(30).len(), 30);
        assert_eq!(link.bus_mut().remaining(), 70);
    }

    #[test]
    fn test_drain_of_exhausted_bus_is_empty_not_error() {
        let mut link = SamplerLink::new(SimBus::with_samples([]));
        assert!(link.read_samples(5000).is_empty());
    }

    #[test]
    fn test_commands_reach_bus_as_single_bytes() {
        let bus = SimBus::with_samples([]);
        let journal = bus.command_journal();
        let mut link = SamplerLink::new(bus);

        link.send_command(Command::Start).unwrap();
        link.send_command(Command::Stop).unwrap();
        assert_eq!(*journal.lock().unwrap(), vec![b'S', b'E']);
    }

    proptest! {
        /// However many samples the peripheral holds, a drain returns the
        /// buffered prefix capped at the requested maximum, in order.
        #[test]
        fn test_drain_returns_ordered_prefix(
            buffered in proptest::collection::vec(any::<Sample>(), 0..200),
            max_count in 0usize..250,
        ) {
            let mut link = SamplerLink::new(SimBus::with_samples(buffered.clone()));
            let drained = link.read_samples(max_count);

            let expected_len = buffered.len().min(max_count);
            prop_assert_eq!(drained.len(), expected_len);
            prop_assert_eq!(&drained[..], &buffered[..expected_len]);
        }
    }
}
