//! Task contracts the runner drives.
//!
//! An aggregator collects one named data point; a sensor inspects the
//! aggregated data and yields one named outcome. The name is the key under
//! which the value lands in the output map.

use crate::error::TaskError;
use serde_json::Value;
use std::collections::HashMap;

/// Name-keyed values produced by a cycle.
pub type Results = HashMap<String, Value>;

/// A task that collects or computes a named data point.
pub trait Aggregator {
    fn name(&self) -> &str;

    fn aggregate(&self) -> Result<Value, TaskError>;
}

/// A task that validates previously aggregated data.
pub trait Sensor {
    fn name(&self) -> &str;

    fn validate(&self, aggregated: &Results) -> Result<Value, TaskError>;
}

impl std::fmt::Debug for dyn Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator").field("name", &self.name()).finish()
    }
}

impl std::fmt::Debug for dyn Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor").field("name", &self.name()).finish()
    }
}
