//! Built-in aggregators and sensors.

use crate::error::TaskError;
use crate::task::{Aggregator, Results, Sensor};
use serde_json::Value;

/// Aggregator that always reports the same value.
#[derive(Debug, Clone)]
pub struct StaticAggregator {
    name: String,
    value: Value,
}

impl StaticAggregator {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Aggregator for StaticAggregator {
    fn name(&self) -> &str {
        &self.name
    }

    fn aggregate(&self) -> Result<Value, TaskError> {
        Ok(self.value.clone())
    }
}

/// Aggregator backed by a closure.
pub struct FnAggregator<F> {
    name: String,
    func: F,
}

impl<F> FnAggregator<F>
where
    F: Fn() -> Result<Value, TaskError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Aggregator for FnAggregator<F>
where
    F: Fn() -> Result<Value, TaskError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn aggregate(&self) -> Result<Value, TaskError> {
        (self.func)()
    }
}

/// Sensor backed by a closure.
pub struct FnSensor<F> {
    name: String,
    func: F,
}

impl<F> FnSensor<F>
where
    F: Fn(&Results) -> Result<Value, TaskError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Sensor for FnSensor<F>
where
    F: Fn(&Results) -> Result<Value, TaskError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, aggregated: &Results) -> Result<Value, TaskError> {
        (self.func)(aggregated)
    }
}

/// Sensor that checks one numeric reading against open bounds.
///
/// Reads `aggregated[source]`, optionally descends into a dotted `field`
/// path, and reports `true` when the number is strictly above `above` and
/// strictly below `below` (either bound may be absent). Numeric path
/// segments index into arrays, so `disks.0.used` reads the first disk.
#[derive(Debug, Clone)]
pub struct ThresholdSensor {
    name: String,
    source: String,
    field: Option<String>,
    above: Option<f64>,
    below: Option<f64>,
}

impl ThresholdSensor {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            field: None,
            above: None,
            below: None,
        }
    }

    /// Descend into this dotted path of the source value.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn above(mut self, bound: f64) -> Self {
        self.above = Some(bound);
        self
    }

    pub fn below(mut self, bound: f64) -> Self {
        self.below = Some(bound);
        self
    }

    fn reading(&self, aggregated: &Results) -> Result<f64, TaskError> {
        let mut value = aggregated.get(&self.source).ok_or_else(|| {
            TaskError::new(&self.name, format!("no aggregated data for '{}'", self.source))
        })?;

        if let Some(ref path) = self.field {
            for segment in path.split('.') {
                let next = match (value.as_array(), segment.parse::<usize>()) {
                    (Some(items), Ok(index)) => items.get(index),
                    _ => value.get(segment),
                };
                value = next.ok_or_else(|| {
                    TaskError::new(
                        &self.name,
                        format!("'{}' has no field '{}'", self.source, path),
                    )
                })?;
            }
        }

        value.as_f64().ok_or_else(|| {
            TaskError::new(
                &self.name,
                format!("value for '{}' is not numeric: {}", self.source, value),
            )
        })
    }
}

impl Sensor for ThresholdSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, aggregated: &Results) -> Result<Value, TaskError> {
        let reading = self.reading(aggregated)?;

        let above_ok = self.above.map_or(true, |bound| reading > bound);
        let below_ok = self.below.map_or(true, |bound| reading < bound);

        Ok(Value::Bool(above_ok && below_ok))
    }
}
