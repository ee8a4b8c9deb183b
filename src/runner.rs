//! The cooldown-gated aggregator/sensor runner.
//!
//! A [`Runner`] keeps two ordered queues. Aggregators run only when the
//! cooldown since the last gated pass has elapsed and their output
//! accumulates in a persistent name-keyed map. Sensors run on demand over
//! whatever map the caller hands them. A failing task never aborts a pass:
//! its error goes to the notifier and the loop moves on.

use crate::clock::{Clock, SystemClock};
use crate::error::RunnerError;
use crate::notify::{Notifier, TracingNotifier};
use crate::task::{Aggregator, Results, Sensor};
use tracing::{debug, info};

/// Cooldown used by [`Runner::default`].
pub const DEFAULT_THRESHOLD_MINUTES: i64 = 5;

/// Whether the cooldown that started at `last_check` has elapsed at `now`.
///
/// The gate opens strictly after `last_check + threshold_minutes * 60`.
/// A negative threshold is applied as-is and opens the gate before
/// `last_check`.
pub fn ready(last_check: i64, threshold_minutes: i64, now: i64) -> bool {
    let next_allowed = last_check.saturating_add(threshold_minutes.saturating_mul(60));
    now > next_allowed
}

/// Periodic task runner.
pub struct Runner<C = SystemClock, N = TracingNotifier> {
    aggregators: Vec<Box<dyn Aggregator>>,
    sensors: Vec<Box<dyn Sensor>>,
    aggregated: Results,
    last_check: i64,
    threshold_minutes: i64,
    clock: C,
    notifier: N,
}

impl Runner {
    /// Create a runner on the system clock that logs task failures.
    pub fn new(last_checked: i64, threshold_minutes: i64) -> Self {
        Self::with_collaborators(last_checked, threshold_minutes, SystemClock, TracingNotifier)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(0, DEFAULT_THRESHOLD_MINUTES)
    }
}

impl<C: Clock, N: Notifier> Runner<C, N> {
    /// Create a runner with an explicit clock and failure sink.
    pub fn with_collaborators(
        last_checked: i64,
        threshold_minutes: i64,
        clock: C,
        notifier: N,
    ) -> Self {
        Self {
            aggregators: Vec::new(),
            sensors: Vec::new(),
            aggregated: Results::new(),
            last_check: last_checked,
            threshold_minutes,
            clock,
            notifier,
        }
    }

    /// Unix seconds of the last gated aggregator pass (or the initial value).
    pub fn last_check(&self) -> i64 {
        self.last_check
    }

    pub fn threshold_minutes(&self) -> i64 {
        self.threshold_minutes
    }

    pub fn aggregator_queue(&self) -> &[Box<dyn Aggregator>] {
        &self.aggregators
    }

    pub fn sensor_queue(&self) -> &[Box<dyn Sensor>] {
        &self.sensors
    }

    /// Sink receiving isolated task failures.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Append an aggregator and return the whole queue.
    pub fn enqueue_aggregator(&mut self, task: Box<dyn Aggregator>) -> &[Box<dyn Aggregator>] {
        debug!("Queued aggregator '{}'", task.name());
        self.aggregators.push(task);
        &self.aggregators
    }

    /// Append a sensor and return the whole sensor queue.
    pub fn enqueue_sensor(&mut self, task: Box<dyn Sensor>) -> &[Box<dyn Sensor>] {
        debug!("Queued sensor '{}'", task.name());
        self.sensors.push(task);
        &self.sensors
    }

    /// Replace the aggregator queue wholesale.
    ///
    /// Every task must carry a non-empty name since the name keys its
    /// result. On error the current queue is left as it was.
    pub fn replace_aggregator_queue(
        &mut self,
        tasks: Vec<Box<dyn Aggregator>>,
    ) -> Result<&[Box<dyn Aggregator>], RunnerError> {
        check_names("aggregator", tasks.iter().map(|t| t.name()))?;
        self.aggregators = tasks;
        Ok(&self.aggregators)
    }

    /// Replace the sensor queue wholesale. Same contract as
    /// [`Runner::replace_aggregator_queue`].
    pub fn replace_sensor_queue(
        &mut self,
        tasks: Vec<Box<dyn Sensor>>,
    ) -> Result<&[Box<dyn Sensor>], RunnerError> {
        check_names("sensor", tasks.iter().map(|t| t.name()))?;
        self.sensors = tasks;
        Ok(&self.sensors)
    }

    /// Whether an aggregator pass would run right now.
    pub fn is_ready(&self) -> bool {
        ready(self.last_check, self.threshold_minutes, self.clock.now())
    }

    /// Run every queued aggregator if the cooldown has elapsed.
    ///
    /// Returns the accumulated results either way. The queue is kept, so
    /// the next ready pass runs the same tasks again. A gated pass restarts
    /// the cooldown from the time it finished.
    pub fn run_aggregators(&mut self) -> &Results {
        if self.try_run_aggregators().is_none() {
            debug!(
                last_check = self.last_check,
                threshold_minutes = self.threshold_minutes,
                "Cooldown active, skipping aggregators"
            );
        }
        &self.aggregated
    }

    /// Like [`Runner::run_aggregators`], but tells the caller whether the
    /// pass happened. `None` means the cooldown was still active.
    ///
    /// The clock is read once to decide the gate.
    pub fn try_run_aggregators(&mut self) -> Option<&Results> {
        if !ready(self.last_check, self.threshold_minutes, self.clock.now()) {
            return None;
        }

        let mut failed = 0;
        for task in &self.aggregators {
            match task.aggregate() {
                Ok(value) => {
                    self.aggregated.insert(task.name().to_string(), value);
                }
                Err(e) => {
                    failed += 1;
                    self.notifier.notify(&e);
                }
            }
        }

        self.last_check = self.clock.now();
        info!(
            "Aggregator pass complete: {} ran, {} failed",
            self.aggregators.len(),
            failed
        );

        Some(&self.aggregated)
    }

    /// Run every queued sensor against `aggregated`.
    ///
    /// Not gated. Outcomes go into a fresh map that the runner does not keep.
    pub fn run_sensors(&self, aggregated: &Results) -> Results {
        let mut response = Results::new();
        let mut failed = 0;

        for sensor in &self.sensors {
            match sensor.validate(aggregated) {
                Ok(outcome) => {
                    response.insert(sensor.name().to_string(), outcome);
                }
                Err(e) => {
                    failed += 1;
                    self.notifier.notify(&e);
                }
            }
        }

        info!(
            "Sensor pass complete: {} ran, {} failed",
            self.sensors.len(),
            failed
        );

        response
    }

    /// Data collected by aggregators so far.
    pub fn aggregated_data(&self) -> &Results {
        &self.aggregated
    }
}

fn check_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), RunnerError> {
    for (index, name) in names.enumerate() {
        if name.trim().is_empty() {
            return Err(RunnerError::InvalidArgument(format!(
                "{} queue entry {} has an empty name",
                kind, index
            )));
        }
    }
    Ok(())
}
