//! Per-tick cycle reports.

use crate::error::TaskError;
use crate::task::Results;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// What happened during one trigger tick.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// 1-based tick number.
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    /// Whether the cooldown allowed an aggregator pass.
    pub aggregators_ran: bool,
    /// Accumulated aggregator results after the tick.
    pub aggregated: BTreeMap<String, Value>,
    /// Sensor outcomes for this tick.
    pub sensors: BTreeMap<String, Value>,
    /// Task failures isolated during the tick.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<TaskError>,
}

impl CycleReport {
    pub fn new(
        cycle: u64,
        timestamp: DateTime<Utc>,
        aggregators_ran: bool,
        aggregated: &Results,
        sensors: Results,
        failures: Vec<TaskError>,
    ) -> Self {
        Self {
            cycle,
            timestamp,
            aggregators_ran,
            aggregated: aggregated
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            sensors: sensors.into_iter().collect(),
            failures,
        }
    }

    /// Sensors that reported `false`.
    pub fn alerts(&self) -> Vec<&str> {
        self.sensors
            .iter()
            .filter(|(_, outcome)| **outcome == Value::Bool(false))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Render as a single JSON line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render for humans.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        let gate = if self.aggregators_ran {
            "aggregators ran"
        } else {
            "cooldown active"
        };
        lines.push(format!(
            "Cycle {} at {} ({})",
            self.cycle,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            gate
        ));

        for (name, value) in &self.aggregated {
            lines.push(format!("  📈 {} = {}", name, value));
        }

        for (name, outcome) in &self.sensors {
            let marker = if *outcome == Value::Bool(false) {
                "🔴"
            } else {
                "🟢"
            };
            lines.push(format!("  {} {} = {}", marker, name, outcome));
        }

        for failure in &self.failures {
            lines.push(format!("  ⚠️  {}", failure));
        }

        lines.join("\n")
    }
}
