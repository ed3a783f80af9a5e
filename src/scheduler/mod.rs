use chrono::{Datelike, NaiveDateTime, Timelike};
use log::{debug, error, info, warn};

use crate::models::{Actuator, OutletState, Schedule};
use crate::store::OutletStore;
use crate::utils::time::to_24h;

/// Result of driving one outlet to a target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switched {
    /// Device confirmed and the new state was stored.
    Committed,
    /// Device refused or could not be reached; stored state untouched.
    ActuationFailed,
    /// Device confirmed but the new state could not be stored.
    NotPersisted,
    MissingOutlet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fired: usize,
    pub committed: usize,
    pub failed: usize,
}

/// Actuates one outlet and, only on confirmation, persists its new state.
pub fn switch_outlet(
    outlets: &mut dyn OutletStore,
    actuator: &mut dyn Actuator,
    outlet_id: u32,
    state: OutletState,
) -> Switched {
    let Some(outlet) = outlets.outlet(outlet_id) else {
        error!("no outlet with id {}", outlet_id);
        return Switched::MissingOutlet;
    };

    if let Err(e) = actuator.switch(&outlet, state) {
        warn!(
            "outlet id {} state change to {} failed: {}",
            outlet.id, state, e
        );
        return Switched::ActuationFailed;
    }

    match outlets.set_state(outlet.id, state) {
        Ok(()) => {
            info!("outlet '{}' ({}) is now {}", outlet.name, outlet.id, state);
            Switched::Committed
        }
        Err(e) => {
            error!("outlet id {} switched {} but state not saved: {}", outlet.id, state, e);
            Switched::NotPersisted
        }
    }
}

/// Fires every schedule whose on or off time equals `now` to the minute.
///
/// Each tick stands alone: a minute in which this is not run is never caught up.
pub fn evaluate(
    now: NaiveDateTime,
    schedules: &[Schedule],
    outlets: &mut dyn OutletStore,
    actuator: &mut dyn Actuator,
) -> TickReport {
    let weekday = now.weekday();
    let current = (now.hour(), now.minute());
    let mut report = TickReport::default();

    debug!(
        "evaluating {} schedules for {:?} {:02}:{:02}",
        schedules.len(),
        weekday,
        current.0,
        current.1
    );

    for schedule in schedules {
        if !schedule.runs_on(weekday) {
            continue;
        }

        for (time, state) in [
            (&schedule.on_time, OutletState::On),
            (&schedule.off_time, OutletState::Off),
        ] {
            let Some(at) = to_24h(time) else {
                warn!(
                    "schedule {} has an unreadable {} time '{}'",
                    schedule.id, state, time
                );
                continue;
            };
            if at != current {
                continue;
            }

            info!(
                "schedule {} '{}' fires: outlet {} {}",
                schedule.id, schedule.name, schedule.outlet_id, state
            );
            report.fired += 1;
            match switch_outlet(outlets, actuator, schedule.outlet_id, state) {
                Switched::Committed => report.committed += 1,
                _ => report.failed += 1,
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActuationError, Outlet};
    use crate::store::memory::MemoryOutletStore;
    use chrono::{NaiveDate, Weekday};

    #[derive(Default)]
    struct RecordingActuator {
        calls: Vec<(u32, OutletState)>,
        refuse: bool,
    }

    impl Actuator for RecordingActuator {
        fn switch(&mut self, outlet: &Outlet, state: OutletState) -> Result<(), ActuationError> {
            self.calls.push((outlet.id, state));
            if self.refuse {
                return Err(ActuationError {
                    outlet_id: outlet.id,
                    state,
                    source: "no ack".into(),
                });
            }
            Ok(())
        }
    }

    // 2024-05-06 is a Monday
    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn outlet(id: u32, state: Option<OutletState>) -> Outlet {
        Outlet {
            id,
            name: format!("outlet-{}", id),
            channel: id,
            state,
        }
    }

    fn schedule(id: u32, days: &[Weekday], on: &str, off: &str, outlet_id: u32) -> Schedule {
        Schedule {
            id,
            name: format!("schedule-{}", id),
            days: days.to_vec(),
            on_time: on.to_string(),
            off_time: off.to_string(),
            outlet_id,
        }
    }

    #[test]
    fn test_off_time_fires_and_persists() {
        let schedules = [schedule(1, &[Weekday::Mon], "6:00 am", "10:00 pm", 1)];
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, Some(OutletState::On))]);
        let mut actuator = RecordingActuator::default();

        let report = evaluate(monday_at(22, 0), &schedules, &mut outlets, &mut actuator);

        assert_eq!(actuator.calls, vec![(1, OutletState::Off)]);
        assert_eq!(report.fired, 1);
        assert_eq!(report.committed, 1);
        assert_eq!(outlets.outlet(1).unwrap().state, Some(OutletState::Off));
    }

    #[test]
    fn test_failed_actuation_keeps_state() {
        let schedules = [schedule(1, &[Weekday::Mon], "6:00 am", "10:00 pm", 1)];
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, Some(OutletState::On))]);
        let mut actuator = RecordingActuator {
            refuse: true,
            ..Default::default()
        };

        let report = evaluate(monday_at(22, 0), &schedules, &mut outlets, &mut actuator);

        assert_eq!(actuator.calls.len(), 1);
        assert_eq!(report.failed, 1);
        assert_eq!(outlets.commits, 0);
        assert_eq!(outlets.outlet(1).unwrap().state, Some(OutletState::On));
    }

    #[test]
    fn test_on_time_in_24h_format() {
        let schedules = [schedule(1, &[Weekday::Mon], "14:05", "18:00", 1)];
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, None)]);
        let mut actuator = RecordingActuator::default();

        evaluate(monday_at(14, 5), &schedules, &mut outlets, &mut actuator);

        assert_eq!(actuator.calls, vec![(1, OutletState::On)]);
        assert_eq!(outlets.outlet(1).unwrap().state, Some(OutletState::On));
    }

    #[test]
    fn test_other_days_and_minutes_do_not_fire() {
        let schedules = [
            schedule(1, &[Weekday::Tue], "10:00 pm", "11:00 pm", 1),
            schedule(2, &[Weekday::Mon], "9:59 pm", "10:01 pm", 1),
        ];
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, None)]);
        let mut actuator = RecordingActuator::default();

        let report = evaluate(monday_at(22, 0), &schedules, &mut outlets, &mut actuator);

        assert!(actuator.calls.is_empty());
        assert_eq!(report, TickReport::default());
    }

    #[test]
    fn test_missing_outlet_does_not_stop_other_schedules() {
        let schedules = [
            schedule(1, &[Weekday::Mon], "7:30 am", "8:00 pm", 99),
            schedule(2, &[Weekday::Mon], "7:30 am", "8:00 pm", 1),
            schedule(3, &[Weekday::Mon], "garbage", "7:30", 2),
        ];
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, None), outlet(2, None)]);
        let mut actuator = RecordingActuator::default();

        let report = evaluate(monday_at(7, 30), &schedules, &mut outlets, &mut actuator);

        assert_eq!(report.fired, 3);
        assert_eq!(report.committed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            actuator.calls,
            vec![(1, OutletState::On), (2, OutletState::Off)]
        );
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let mut outlets = MemoryOutletStore::new(vec![outlet(1, None)]);
        outlets.fail_commits = true;
        let mut actuator = RecordingActuator::default();

        let result = switch_outlet(&mut outlets, &mut actuator, 1, OutletState::On);

        assert_eq!(result, Switched::NotPersisted);
        assert_eq!(outlets.outlet(1).unwrap().state, None);
    }

    #[test]
    fn test_switch_missing_outlet() {
        let mut outlets = MemoryOutletStore::new(vec![]);
        let mut actuator = RecordingActuator::default();

        let result = switch_outlet(&mut outlets, &mut actuator, 5, OutletState::Off);

        assert_eq!(result, Switched::MissingOutlet);
        assert!(actuator.calls.is_empty());
    }
}
