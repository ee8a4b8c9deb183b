//! External periodic trigger.
//!
//! The runner has no timer of its own. This module drives it from a tokio
//! interval: every tick attempts an aggregator pass, then runs the sensors
//! over the accumulated data and emits a [`CycleReport`].

use crate::clock::Clock;
use crate::notify::CollectingNotifier;
use crate::report::CycleReport;
use crate::runner::Runner;
use chrono::DateTime;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Run one tick: gated aggregator pass followed by a sensor pass.
///
/// The report is stamped with the runner's clock at the start of the tick.
pub fn tick<C: Clock>(runner: &mut Runner<C, CollectingNotifier>, cycle: u64) -> CycleReport {
    let started = DateTime::from_timestamp(runner.clock().now(), 0).unwrap_or_default();

    let aggregators_ran = runner.try_run_aggregators().is_some();
    let aggregated = runner.aggregated_data().clone();
    let sensors = runner.run_sensors(&aggregated);
    let failures = runner.notifier().drain();

    CycleReport::new(cycle, started, aggregators_ran, &aggregated, sensors, failures)
}

/// Tick every `period` until `max_cycles` ticks have run (forever when `None`).
///
/// The first tick fires immediately. Returns the number of ticks run.
pub async fn run_schedule<C, F>(
    runner: &mut Runner<C, CollectingNotifier>,
    period: Duration,
    max_cycles: Option<u64>,
    mut emit: F,
) -> u64
where
    C: Clock,
    F: FnMut(&CycleReport),
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycle = 0;
    while max_cycles.map_or(true, |max| cycle < max) {
        ticker.tick().await;
        cycle += 1;
        debug!("Tick {}", cycle);

        let report = tick(runner, cycle);
        emit(&report);
    }

    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::TaskError;
    use crate::tasks::{FnAggregator, StaticAggregator, ThresholdSensor};
    use serde_json::json;
    use std::cell::Cell;

    /// Clock that moves one second forward on every read.
    struct SteppingClock(Cell<i64>);

    impl Clock for SteppingClock {
        fn now(&self) -> i64 {
            let now = self.0.get();
            self.0.set(now + 1);
            now
        }
    }

    fn runner_at(now: i64, last_checked: i64) -> Runner<ManualClock, CollectingNotifier> {
        let mut runner = Runner::with_collaborators(
            last_checked,
            5,
            ManualClock::new(now),
            CollectingNotifier::new(),
        );
        runner.enqueue_aggregator(Box::new(StaticAggregator::new("cpu", json!({"v": 1}))));
        runner.enqueue_aggregator(Box::new(FnAggregator::new("disk", || {
            Err(TaskError::new("disk", "unmounted"))
        })));
        runner.enqueue_sensor(Box::new(
            ThresholdSensor::new("threshold-check", "cpu").field("v").above(0.0),
        ));
        runner
    }

    #[test]
    fn test_tick_reports_pass_and_failures() {
        let mut runner = runner_at(10_000, 0);

        let report = tick(&mut runner, 1);

        assert!(report.aggregators_ran);
        assert_eq!(report.aggregated["cpu"], json!({"v": 1}));
        assert_eq!(report.sensors["threshold-check"], json!(true));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task, "disk");
        assert!(runner.notifier().errors().is_empty());
    }

    #[test]
    fn test_tick_inside_cooldown_still_runs_sensors() {
        let mut runner = runner_at(10_000, 10_000);

        let report = tick(&mut runner, 1);

        assert!(!report.aggregators_ran);
        assert!(report.aggregated.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task, "threshold-check");
        assert!(report.sensors.is_empty());
    }

    #[test]
    fn test_run_schedule_stops_after_max_cycles() {
        let mut runner = runner_at(10_000, 0);
        let mut reports = Vec::new();

        let ran = tokio_test::block_on(run_schedule(
            &mut runner,
            Duration::from_millis(1),
            Some(3),
            |report| reports.push(report.clone()),
        ));

        assert_eq!(ran, 3);
        assert_eq!(reports.len(), 3);
        // The manual clock never moves, so only the first tick clears the gate.
        assert!(reports[0].aggregators_ran);
        assert!(!reports[1].aggregators_ran);
        assert!(!reports[2].aggregators_ran);
        assert_eq!(reports[2].sensors["threshold-check"], json!(true));
    }

    #[test]
    fn test_run_schedule_zero_cycles() {
        let mut runner = runner_at(10_000, 0);

        let ran = tokio_test::block_on(run_schedule(
            &mut runner,
            Duration::from_millis(1),
            Some(0),
            |_| panic!("no tick expected"),
        ));

        assert_eq!(ran, 0);
        assert!(runner.aggregated_data().is_empty());
    }

    #[test]
    fn test_tick_gate_flag_matches_pass_on_moving_clock() {
        let mut runner = Runner::with_collaborators(
            0,
            5,
            SteppingClock(Cell::new(300)),
            CollectingNotifier::new(),
        );
        runner.enqueue_aggregator(Box::new(StaticAggregator::new("cpu", json!(1))));

        let report = tick(&mut runner, 1);

        assert_eq!(report.aggregators_ran, report.aggregated.contains_key("cpu"));
    }

    #[test]
    fn test_tick_timestamp_comes_from_runner_clock() {
        let mut runner = runner_at(10_000, 0);

        let report = tick(&mut runner, 1);

        assert_eq!(report.timestamp.timestamp(), 10_000);
        assert_eq!(report.timestamp, DateTime::<chrono::Utc>::from_timestamp(10_000, 0).unwrap());
    }
}
