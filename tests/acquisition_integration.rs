// tests/acquisition_integration.rs
//! End-to-end capture tests over the scripted simulator

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use weldlog::acquisition::{AcquisitionController, CaptureSettings};
use weldlog::config::constants::capture;
use weldlog::hal::simulator::{SimBus, SimTrigger, SimWait};
use weldlog::storage::{CaptureLog, TIMESTAMP_FORMAT};
use weldlog::{CommandBus, CycleOutcome, Edge, TriggerLine, Wait};

fn fast_settings() -> CaptureSettings {
    CaptureSettings {
        start_settle_ms: 0,
        stop_settle_ms: 0,
        ..CaptureSettings::default()
    }
}

fn unset() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read the capture log")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_record_is_stamped_between_trigger_and_persist() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = CaptureLog::open(dir.path().join("weld.csv")).expect("Failed to open log");

    let before = Local::now();
    let mut controller = AcquisitionController::new(
        SimBus::with_samples([10, 20, 30]),
        SimTrigger::scripted("start", [SimWait::Now]),
        SimTrigger::scripted("end", [SimWait::Now]),
        store,
        fast_settings(),
        unset(),
    );
    let outcome = controller.run_cycle().expect("Cycle failed");
    let after = Local::now();

    match outcome {
        CycleOutcome::Completed { record } => {
            assert_eq!(record.samples, vec![10, 20, 30]);
            assert!(record.timestamp >= before && record.timestamp <= after);
        }
        CycleOutcome::Interrupted => panic!("cycle should have completed"),
    }
}

#[test]
fn test_default_cap_bounds_a_long_burst() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = CaptureLog::open(dir.path().join("weld.csv")).expect("Failed to open log");

    // Burst longer than the cap; the drain must stop at the limit
    let mut controller = AcquisitionController::new(
        SimBus::generating(capture::DEFAULT_MAX_SAMPLES + 1000),
        SimTrigger::scripted("start", [SimWait::Now]),
        SimTrigger::scripted("end", [SimWait::Now]),
        store,
        fast_settings(),
        unset(),
    );
    let outcome = controller.run_cycle().expect("Cycle failed");

    match outcome {
        CycleOutcome::Completed { record } => {
            assert_eq!(record.samples.len(), capture::DEFAULT_MAX_SAMPLES);
        }
        CycleOutcome::Interrupted => panic!("cycle should have completed"),
    }
}

#[test]
fn test_csv_rows_mirror_the_cycle_history() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("weld.csv");
    let store = CaptureLog::open(&path).expect("Failed to open log");

    // Seven queued samples drained three at a time: 3, 3, 1, then empty
    let mut controller = AcquisitionController::new(
        SimBus::with_samples(0u16..7),
        SimTrigger::scripted("start", [SimWait::Now; 4]),
        SimTrigger::scripted("end", [SimWait::Now; 4]),
        store,
        CaptureSettings {
            max_samples: 3,
            start_settle_ms: 0,
            stop_settle_ms: 0,
            ..CaptureSettings::default()
        },
        unset(),
    );
    let summary = controller.run().expect("Run failed");
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.samples, 7);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Timestamp,Samples...");
    assert!(lines[1].ends_with(",0,1,2"));
    assert!(lines[2].ends_with(",3,4,5"));
    assert!(lines[3].ends_with(",6"));
    // The empty cycle still gets a row: a bare timestamp
    assert_eq!(lines[4].split(',').count(), 1);

    // Every data row starts with a well-formed local timestamp
    for line in &lines[1..] {
        let stamp = line.split(',').next().expect("Empty row");
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).expect("Bad timestamp");
    }
}

#[test]
fn test_restarted_run_appends_without_second_header() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("weld.csv");

    for _ in 0..2 {
        let store = CaptureLog::open(&path).expect("Failed to open log");
        let mut controller = AcquisitionController::new(
            SimBus::with_samples([500u16, 600]),
            SimTrigger::scripted("start", [SimWait::Now]),
            SimTrigger::scripted("end", [SimWait::Now]),
            store,
            fast_settings(),
            unset(),
        );
        controller.run().expect("Run failed");
    }

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Timestamp,Samples...");
    let headers = lines
        .iter()
        .filter(|line| *line == "Timestamp,Samples...")
        .count();
    assert_eq!(headers, 1);
    assert!(lines[1].ends_with(",500,600"));
    assert!(lines[2].ends_with(",500,600"));
}

#[test]
fn test_run_waits_only_on_the_configured_lines() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = CaptureLog::open(dir.path().join("weld.csv")).expect("Failed to open log");

    let start = SimTrigger::scripted("gpiochip0:5", [SimWait::Now, SimWait::Now]);
    let end = SimTrigger::scripted("gpiochip0:6", [SimWait::Now, SimWait::Now]);
    let start_waits = start.wait_journal();
    let end_waits = end.wait_journal();

    let mut controller = AcquisitionController::new(
        SimBus::with_samples([]),
        start,
        end,
        store,
        fast_settings(),
        unset(),
    );
    controller.run().expect("Run failed");

    // Two full cycles plus the wind-down wait, all falling edges on 5
    let starts = start_waits.lock().unwrap();
    assert_eq!(starts.len(), 3);
    assert!(starts
        .iter()
        .all(|w| w.line == "gpiochip0:5" && w.edge == Edge::Falling));

    let ends = end_waits.lock().unwrap();
    assert_eq!(ends.len(), 2);
    assert!(ends
        .iter()
        .all(|w| w.line == "gpiochip0:6" && w.edge == Edge::Rising));
}

/// Trigger wrapper that counts how many times it is dropped
struct ReleaseTracking {
    inner: SimTrigger,
    drops: Arc<AtomicUsize>,
}

impl Drop for ReleaseTracking {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl TriggerLine for ReleaseTracking {
    type Error = <SimTrigger as TriggerLine>::Error;

    fn id(&self) -> String {
        self.inner.id()
    }

    fn wait_for_edge(
        &mut self,
        edge: Edge,
        cancel: Option<&AtomicBool>,
    ) -> Result<Wait, Self::Error> {
        self.inner.wait_for_edge(edge, cancel)
    }
}

/// Bus wrapper that counts how many times it is dropped
struct ReleaseTrackingBus {
    inner: SimBus,
    drops: Arc<AtomicUsize>,
}

impl Drop for ReleaseTrackingBus {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl CommandBus for ReleaseTrackingBus {
    type Error = <SimBus as CommandBus>::Error;

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        self.inner.write_byte(value)
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read_block(register, buf)
    }
}

#[test]
fn test_interrupt_releases_every_handle_exactly_once() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("weld.csv");
    let store = CaptureLog::open(&path).expect("Failed to open log");

    let drops = Arc::new(AtomicUsize::new(0));
    let bus = ReleaseTrackingBus {
        inner: SimBus::with_samples([]),
        drops: Arc::clone(&drops),
    };
    let start = ReleaseTracking {
        inner: SimTrigger::scripted("start", [SimWait::Now]),
        drops: Arc::clone(&drops),
    };
    let end = ReleaseTracking {
        inner: SimTrigger::scripted("end", [SimWait::Cancelled]),
        drops: Arc::clone(&drops),
    };

    // The interrupt lands mid-cycle, between the start and end triggers
    let mut controller =
        AcquisitionController::new(bus, start, end, store, fast_settings(), unset());
    let summary = controller.run().expect("Run failed");
    assert_eq!(summary.cycles, 0);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(controller);
    // Both trigger lines and the bus handle, once each
    assert_eq!(drops.load(Ordering::SeqCst), 3);

    // The abandoned cycle persisted nothing
    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_interrupted_cycle_leaves_only_complete_rows() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("weld.csv");
    let store = CaptureLog::open(&path).expect("Failed to open log");

    let bus = SimBus::with_samples([1u16, 2]);
    let journal = bus.command_journal();
    let mut controller = AcquisitionController::new(
        bus,
        SimTrigger::scripted("start", [SimWait::Now, SimWait::Now]),
        SimTrigger::scripted("end", [SimWait::Now, SimWait::Cancelled]),
        store,
        fast_settings(),
        unset(),
    );
    let summary = controller.run().expect("Run failed");

    // The second cycle was armed but cut off before its end trigger
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.samples, 2);
    assert_eq!(*journal.lock().unwrap(), vec![b'S', b'E', b'S']);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",1,2"));
}
