// src/bin/weldlog.rs
//! Capture daemon: waits for weld trigger edges, drains the sampler over the
//! command bus, and appends one CSV record per completed cycle. Runs until
//! interrupted; Ctrl+C finishes or abandons the cycle in flight and exits
//! cleanly.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weldlog::acquisition::AcquisitionController;
use weldlog::config::constants::simulation;
use weldlog::config::{ConfigLoader, SystemConfig};
use weldlog::hal::simulator::{SimBus, SimTrigger};
use weldlog::storage::CaptureLog;
use weldlog::RunSummary;

#[derive(Debug, Parser)]
#[command(name = "weldlog")]
#[command(about = "Trigger-gated weld cycle data acquisition")]
#[command(version)]
struct Cli {
    /// Configuration file; replaces the standard search locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run against the built-in simulator instead of real hardware
    #[arg(long)]
    simulate: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(cli: &Cli) -> Result<SystemConfig> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    loader.load().context("loading configuration")
}

fn run_simulated(config: &SystemConfig, cancel: Arc<AtomicBool>) -> Result<RunSummary> {
    let period = Duration::from_millis(simulation::DEFAULT_EDGE_PERIOD_MS);
    log::info!(
        "simulating: {}-sample bursts, edges every {:?}",
        simulation::DEFAULT_BURST_LEN,
        period
    );

    let store = CaptureLog::open(&config.storage.path)?;
    let mut controller = AcquisitionController::new(
        SimBus::generating(simulation::DEFAULT_BURST_LEN),
        SimTrigger::periodic("sim-start", period),
        SimTrigger::periodic("sim-end", period),
        store,
        config.capture.clone(),
        cancel,
    );
    Ok(controller.run()?)
}

#[cfg(feature = "hardware")]
fn run_hardware(config: &SystemConfig, cancel: Arc<AtomicBool>) -> Result<RunSummary> {
    use weldlog::config::constants::trigger;
    use weldlog::hal::cdev::{CdevTrigger, LinuxI2cBus};
    use weldlog::Error;

    let bus = LinuxI2cBus::open(&config.bus.device, config.bus.address).with_context(|| {
        format!(
            "opening {} at address 0x{:02X}",
            config.bus.device.display(),
            config.bus.address
        )
    })?;

    let triggers = &config.triggers;
    let poll = triggers.poll_interval();
    let claim = |offset: u32| -> Result<CdevTrigger, Error> {
        CdevTrigger::open(
            &triggers.chip,
            offset,
            triggers.bias,
            trigger::CONSUMER_LABEL,
            poll,
        )
        .map_err(|err| Error::TriggerSetup {
            line: format!("{}:{}", triggers.chip.display(), offset),
            source: Box::new(err),
        })
    };
    let start = claim(triggers.start_line)?;
    let end = claim(triggers.end_line)?;

    let store = CaptureLog::open(&config.storage.path)?;
    let mut controller = AcquisitionController::new(
        bus,
        start,
        end,
        store,
        config.capture.clone(),
        cancel,
    );
    Ok(controller.run()?)
}

#[cfg(not(feature = "hardware"))]
fn run_hardware(_config: &SystemConfig, _cancel: Arc<AtomicBool>) -> Result<RunSummary> {
    Err(weldlog::Error::HardwareSupportDisabled.into())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    log::info!("weldlog {} starting", weldlog::VERSION);
    log::info!("{}", config.summary());

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("installing the shutdown handler")?;

    let summary = if cli.simulate {
        run_simulated(&config, cancel)?
    } else {
        run_hardware(&config, cancel)?
    };

    log::info!(
        "run finished: {} cycles, {} samples logged to {}",
        summary.cycles,
        summary.samples,
        config.storage.path.display()
    );
    Ok(())
}
