//! MicroMetrics - minimal periodic task runner
//!
//! Holds two ordered queues of named tasks: aggregators that collect data
//! points and sensors that validate the collected data. Aggregator passes
//! are gated by a cooldown; sensor passes run on demand. A failing task is
//! reported to a notifier and never aborts the rest of the pass.

pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod task;
pub mod tasks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RunnerError, TaskError};
pub use notify::{CollectingNotifier, Notifier, TracingNotifier};
pub use runner::{ready, Runner, DEFAULT_THRESHOLD_MINUTES};
pub use task::{Aggregator, Results, Sensor};
