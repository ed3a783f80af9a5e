pub mod client;
pub mod collectors;
pub mod config;
pub mod models;
pub mod protocol;
pub mod scheduler;
pub mod store;
pub mod utils;

use crate::client::{RfActuator, RfSettings, RfTransmitter, SerialConnector, SerialTransport, Transport};
use crate::collectors::{poll_and_commit, should_poll, PollContext, PollReport};
use crate::config::{AppConfig, POLLING_INTERVAL};
use crate::models::OutletState;
use crate::scheduler::{Switched, TickReport};
use crate::store::{FileOutletStore, JsonLinesSink};
use crate::utils::time::truncate_to_minute;
use anyhow::{bail, Context};
use chrono::{NaiveDateTime, Timelike};
use log::{debug, error, info};

/// One unattended job, as selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Poll,
    Schedule,
    Outlet { id: u32, state: OutletState },
    Transmit { channel: u32, state: OutletState },
    Ports,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// This minute is not a polling minute; nothing was done.
    Skipped,
    Completed(PollReport),
}

pub fn run(action: &Action, config: &AppConfig, now: NaiveDateTime) -> anyhow::Result<()> {
    info!("Starting {:?}", action);

    let result = match action {
        Action::Poll => run_poll(config, now).map(|_| ()),
        Action::Schedule => run_schedule(config, now).map(|_| ()),
        Action::Outlet { id, state } => run_outlet(config, *id, *state),
        Action::Transmit { channel, state } => run_transmit(config, *channel, *state),
        Action::Ports => list_ports(),
    };

    match result {
        Ok(()) => {
            debug!("{:?} completed successfully", action);
            Ok(())
        }
        Err(e) => {
            error!("Application error: {e}");
            // Print chain of error causes
            let mut source = e.source();
            while let Some(e) = source {
                error!("Caused by: {e}");
                source = e.source();
            }
            Err(e)
        }
    }
}

/// Polls all sensors once, if `now` falls on the configured polling interval.
pub fn run_poll(config: &AppConfig, now: NaiveDateTime) -> anyhow::Result<PollStatus> {
    let now = truncate_to_minute(now);

    let interval = config
        .settings
        .polling_interval()
        .context("could not determine polling interval from settings")?;
    if interval == 0 {
        bail!("setting '{}' must be greater than zero", POLLING_INTERVAL);
    }

    if !should_poll(now.minute(), interval) {
        debug!(
            "minute {} is not on the {} minute polling interval",
            now.minute(),
            interval
        );
        return Ok(PollStatus::Skipped);
    }

    let ctx = PollContext {
        now,
        fahrenheit: config.settings.fahrenheit(),
        codes: config.protocol.codes.clone(),
        humidity_subtype: config.protocol.humidity_subtype,
        max_response_lines: config.protocol.max_response_lines,
    };

    let mut transport =
        SerialTransport::open(&config.serial).context("Failed to open serial port")?;
    let mut sink = JsonLinesSink::new(&config.store.measurements);

    let report = poll_and_commit(
        &ctx,
        &mut transport,
        &config.sensors,
        &config.measurement_types,
        &mut sink,
    );
    transport.close();

    let report = report.context("Failed to store measurements")?;
    Ok(PollStatus::Completed(report))
}

fn rf_actuator(config: &AppConfig) -> RfActuator<SerialConnector> {
    RfActuator::new(RfTransmitter::new(
        SerialConnector::new(config.serial.clone()),
        config.protocol.codes.clone(),
        RfSettings::from(&config.settings),
    ))
}

/// Evaluates every schedule against `now` and switches the outlets that are due.
pub fn run_schedule(config: &AppConfig, now: NaiveDateTime) -> anyhow::Result<TickReport> {
    let schedules = config
        .schedules
        .as_deref()
        .context("no schedules configured")?;

    let mut outlets = FileOutletStore::open(&config.store.outlet_states, &config.outlets)
        .context("Failed to load outlet states")?;
    let mut actuator = rf_actuator(config);

    let report = scheduler::evaluate(now, schedules, &mut outlets, &mut actuator);
    info!(
        "schedule tick: {} fired, {} committed, {} failed",
        report.fired, report.committed, report.failed
    );
    Ok(report)
}

/// Switches a single outlet by id, outside of any schedule.
pub fn run_outlet(config: &AppConfig, id: u32, state: OutletState) -> anyhow::Result<()> {
    let mut outlets = FileOutletStore::open(&config.store.outlet_states, &config.outlets)
        .context("Failed to load outlet states")?;
    let mut actuator = rf_actuator(config);

    match scheduler::switch_outlet(&mut outlets, &mut actuator, id, state) {
        Switched::Committed => Ok(()),
        other => bail!("outlet {} was not switched {}: {:?}", id, state, other),
    }
}

/// Sends a raw RF channel code without touching any stored outlet state.
pub fn run_transmit(config: &AppConfig, channel: u32, state: OutletState) -> anyhow::Result<()> {
    let transmitter = RfTransmitter::new(
        SerialConnector::new(config.serial.clone()),
        config.protocol.codes.clone(),
        RfSettings::from(&config.settings),
    );
    transmitter
        .transmit(channel, state)
        .context(format!("rf channel {} {} failed", channel, state))
}

pub fn list_ports() -> anyhow::Result<()> {
    let ports = client::serial::available_ports().context("Failed to list serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for (name, kind) in ports {
        println!("{} ({})", name, kind);
    }
    Ok(())
}
