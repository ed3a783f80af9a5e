use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::time::Instant;

use crate::client::Transport;
use crate::models::measurement::round_tenths;
use crate::models::{Family, Measurement, MeasurementType, Sensor};
use crate::protocol::{
    build_sensor_command, format_label, to_fahrenheit, CodeTable, Quantity, Reading, Response,
};
use crate::store::{MeasurementSink, StoreError};

/// Everything a poll run needs to know besides the inventory.
#[derive(Debug, Clone)]
pub struct PollContext {
    /// Run start, truncated to the minute. Stamped on every measurement.
    pub now: NaiveDateTime,
    pub fahrenheit: bool,
    pub codes: CodeTable,
    pub humidity_subtype: bool,
    pub max_response_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub commands_sent: usize,
    pub commands_skipped: usize,
    pub failures: usize,
    pub staged: usize,
    pub dropped: usize,
}

/// `minute % interval == 0`. Minutes in between are skipped outright, not caught up later.
pub fn should_poll(minute: u32, interval: u32) -> bool {
    interval > 0 && minute % interval == 0
}

pub struct Poller<'a> {
    ctx: &'a PollContext,
    measurement_types: &'a [MeasurementType],
}

impl<'a> Poller<'a> {
    pub fn new(ctx: &'a PollContext, measurement_types: &'a [MeasurementType]) -> Self {
        Self {
            ctx,
            measurement_types,
        }
    }

    /// Queries every sensor for every family it is tagged with and returns the staged measurements.
    pub fn poll(
        &self,
        transport: &mut dyn Transport,
        sensors: &[Sensor],
    ) -> (Vec<Measurement>, PollReport) {
        let start = Instant::now();
        let mut staged = Vec::new();
        let mut report = PollReport::default();

        for sensor in sensors {
            for family in Family::ALL {
                if sensor.supports(family) {
                    self.poll_family(transport, sensor, family, &mut staged, &mut report);
                }
            }
        }

        report.staged = staged.len();
        debug!("poll took: {} ms", start.elapsed().as_millis());
        (staged, report)
    }

    fn poll_family(
        &self,
        transport: &mut dyn Transport,
        sensor: &Sensor,
        family: Family,
        staged: &mut Vec<Measurement>,
        report: &mut PollReport,
    ) {
        let command = match build_sensor_command(
            &self.ctx.codes,
            sensor,
            family,
            self.ctx.humidity_subtype,
        ) {
            Ok(command) => command,
            Err(e) => {
                warn!(
                    "sensor '{}' measurement '{}' command-build failed: {}",
                    sensor.name, family, e
                );
                report.commands_skipped += 1;
                return;
            }
        };

        if let Err(e) = transport.send(&command) {
            error!(
                "sensor '{}' measurement '{}' could not send '{}': {}",
                sensor.name, family, command, e
            );
            report.failures += 1;
            return;
        }
        report.commands_sent += 1;

        for _ in 0..self.ctx.max_response_lines {
            let line = match transport.read_line() {
                Ok(line) => line,
                Err(e) => {
                    error!("sensor '{}' read error: {}", sensor.name, e);
                    report.failures += 1;
                    return;
                }
            };

            if line.is_empty() {
                warn!(
                    "sensor '{}' measurement '{}' timed out waiting for a response",
                    sensor.name, family
                );
                report.failures += 1;
                return;
            }

            match Response::parse(&line) {
                Response::Ack => return,
                Response::Fail(text) => {
                    warn!(
                        "sensor '{}' measurement '{}' fail result '{}'",
                        sensor.name, family, text
                    );
                    report.failures += 1;
                    return;
                }
                Response::Malformed(text) => {
                    warn!("sensor '{}' garbled output '{}'", sensor.name, text);
                }
                Response::Reading(reading) => self.stage(sensor, reading, staged, report),
            }
        }

        warn!(
            "sensor '{}' measurement '{}' sent {} lines without ok/fail, giving up",
            sensor.name, family, self.ctx.max_response_lines
        );
        report.failures += 1;
    }

    fn stage(
        &self,
        sensor: &Sensor,
        reading: Reading,
        staged: &mut Vec<Measurement>,
        report: &mut PollReport,
    ) {
        let temperature = Quantity::of_code(&reading.code) == Some(Quantity::Temperature);
        let value = round_tenths(if temperature && self.ctx.fahrenheit {
            to_fahrenheit(reading.value)
        } else {
            reading.value
        });

        let Some(mt) = self
            .measurement_types
            .iter()
            .find(|mt| mt.code() == reading.code)
        else {
            warn!(
                "could not match MeasurementType object to code '{}'",
                reading.code
            );
            report.dropped += 1;
            return;
        };

        let label = format_label(&reading.code, value, self.ctx.fahrenheit);
        if label.is_none() {
            warn!("measurement type '{}' not recognized", reading.code);
        }

        let measurement = Measurement::new(mt.id, sensor.id, value, label, self.ctx.now);
        debug!(
            "sensor '{}' pin {} {} = {}",
            sensor.name,
            reading.address,
            mt.name,
            measurement.value_display()
        );
        staged.push(measurement);
    }
}

/// Polls all sensors and hands the staged measurements to `sink` as one batch.
pub fn poll_and_commit(
    ctx: &PollContext,
    transport: &mut dyn Transport,
    sensors: &[Sensor],
    measurement_types: &[MeasurementType],
    sink: &mut dyn MeasurementSink,
) -> Result<PollReport, StoreError> {
    let (staged, report) = Poller::new(ctx, measurement_types).poll(transport, sensors);
    sink.commit(&staged)?;

    info!(
        "poll finished: {} commands sent, {} skipped, {} failed, {} measurements stored, {} dropped",
        report.commands_sent,
        report.commands_skipped,
        report.failures,
        report.staged,
        report.dropped
    );
    Ok(report)
}
