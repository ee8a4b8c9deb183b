//! Configuration file handling.
//!
//! This module handles loading `.micrometrics.toml` files and turning the
//! task tables they declare into a ready-to-drive [`Runner`].

use crate::clock::Clock;
use crate::error::RunnerError;
use crate::notify::Notifier;
use crate::runner::{Runner, DEFAULT_THRESHOLD_MINUTES};
use crate::task::{Aggregator, Sensor};
use crate::tasks::{StaticAggregator, ThresholdSensor};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".micrometrics.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Runner state settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Trigger loop settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Aggregators, in execution order.
    #[serde(default)]
    pub aggregators: Vec<AggregatorConfig>,

    /// Sensors, in execution order.
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

/// Initial runner state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Unix timestamp of the last aggregator pass.
    #[serde(default)]
    pub last_checked: i64,

    /// Cooldown between aggregator passes, in minutes.
    #[serde(default = "default_threshold_minutes")]
    pub threshold_minutes: i64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            last_checked: 0,
            threshold_minutes: default_threshold_minutes(),
        }
    }
}

fn default_threshold_minutes() -> i64 {
    DEFAULT_THRESHOLD_MINUTES
}

/// External trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between ticks.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    /// Stop after this many ticks (unbounded when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            max_cycles: None,
        }
    }
}

fn default_interval() -> u64 {
    60
}

/// An aggregator reporting a fixed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub name: String,

    #[serde(default)]
    pub value: Value,
}

/// A threshold sensor over one aggregated value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,

    /// Name of the aggregator whose result is read.
    pub source: String,

    /// Dotted path into the source value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Reading must be strictly above this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,

    /// Reading must be strictly below this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
}

/// Values from the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold_minutes: Option<i64>,
    pub interval_seconds: Option<u64>,
    pub max_cycles: Option<u64>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Parse configuration text.
    ///
    /// Task lists must be arrays of tables; anything else is rejected with
    /// [`RunnerError::InvalidArgument`] before field-level parsing.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        for key in ["aggregators", "sensors"] {
            if let Some(entry) = table.get(key) {
                let is_task_list = entry
                    .as_array()
                    .is_some_and(|items| items.iter().all(toml::Value::is_table));
                if !is_task_list {
                    return Err(RunnerError::InvalidArgument(format!(
                        "'{}' must be an array of tables",
                        key
                    ))
                    .into());
                }
            }
        }

        let config: Config = toml::Value::Table(table).try_into()?;
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn merge_overrides(&mut self, overrides: &Overrides) {
        if let Some(threshold) = overrides.threshold_minutes {
            self.runner.threshold_minutes = threshold;
        }
        if let Some(interval) = overrides.interval_seconds {
            self.schedule.interval_seconds = interval;
        }
        if overrides.max_cycles.is_some() {
            self.schedule.max_cycles = overrides.max_cycles;
        }
    }

    pub fn build_aggregators(&self) -> Vec<Box<dyn Aggregator>> {
        self.aggregators
            .iter()
            .map(|a| Box::new(StaticAggregator::new(&a.name, a.value.clone())) as Box<dyn Aggregator>)
            .collect()
    }

    pub fn build_sensors(&self) -> Vec<Box<dyn Sensor>> {
        self.sensors
            .iter()
            .map(|s| {
                let mut sensor = ThresholdSensor::new(&s.name, &s.source);
                if let Some(ref field) = s.field {
                    sensor = sensor.field(field);
                }
                if let Some(bound) = s.above {
                    sensor = sensor.above(bound);
                }
                if let Some(bound) = s.below {
                    sensor = sensor.below(bound);
                }
                Box::new(sensor) as Box<dyn Sensor>
            })
            .collect()
    }

    /// Build a runner with both queues populated from this configuration.
    pub fn build_runner<C: Clock, N: Notifier>(
        &self,
        clock: C,
        notifier: N,
    ) -> std::result::Result<Runner<C, N>, RunnerError> {
        let mut runner = Runner::with_collaborators(
            self.runner.last_checked,
            self.runner.threshold_minutes,
            clock,
            notifier,
        );
        runner.replace_aggregator_queue(self.build_aggregators())?;
        runner.replace_sensor_queue(self.build_sensors())?;
        Ok(runner)
    }

    /// A starter configuration with one aggregator and one sensor.
    pub fn sample() -> Self {
        Self {
            aggregators: vec![AggregatorConfig {
                name: "cpu".to_string(),
                value: json!({ "v": 1 }),
            }],
            sensors: vec![SensorConfig {
                name: "threshold-check".to_string(),
                source: "cpu".to_string(),
                field: Some("v".to_string()),
                above: Some(0.0),
                below: None,
            }],
            ..Self::default()
        }
    }

    /// Generate a starter configuration file content.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::sample()).unwrap_or_else(|_| String::new())
    }
}
