//! Host metrics and threshold evaluation.

use crate::monitor::alert::Alert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A sampled host metric. CPU, memory and disk are percentages; temperature
/// is in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    Temperature,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Memory, Metric::Disk, Metric::Temperature];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
            Metric::Disk => "disk",
            Metric::Temperature => "temperature",
        }
    }

    /// Text of the alert raised when this metric is over its limit.
    pub fn alert_message(&self, value: f64) -> String {
        match self {
            Metric::Cpu => format!("High CPU usage: {:.1}%", value),
            Metric::Memory => format!("High memory usage: {:.1}%", value),
            Metric::Disk => format!("High disk usage: {:.1}%", value),
            Metric::Temperature => format!("High temperature: {:.1}°C", value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading of host resources. Metrics that could not be read are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSample {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<Metric, f64>,
}

impl HostSample {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for HostSample {
    fn default() -> Self {
        Self::new()
    }
}

/// One WARNING alert per metric strictly above its limit, in metric order.
/// Unsampled metrics and metrics without a limit never alert.
pub fn evaluate_thresholds(sample: &HostSample, thresholds: &BTreeMap<Metric, f64>) -> Vec<Alert> {
    sample
        .values
        .iter()
        .filter_map(|(metric, value)| {
            let limit = thresholds.get(metric)?;
            (*value > *limit).then(|| Alert::warning(metric.alert_message(*value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::alert::AlertLevel;
    use serde_json::json;

    fn limits() -> BTreeMap<Metric, f64> {
        BTreeMap::from([
            (Metric::Cpu, 85.0),
            (Metric::Memory, 80.0),
            (Metric::Disk, 90.0),
            (Metric::Temperature, 70.0),
        ])
    }

    #[test]
    fn test_cpu_over_limit_alerts_once() {
        let sample = HostSample::new().with(Metric::Cpu, 90.0);
        let alerts = evaluate_thresholds(&sample, &limits());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert_eq!(alerts[0].message, "High CPU usage: 90.0%");
    }

    #[test]
    fn test_at_or_below_limit_is_silent() {
        let sample = HostSample::new()
            .with(Metric::Cpu, 80.0)
            .with(Metric::Memory, 80.0)
            .with(Metric::Disk, 12.5);
        assert!(evaluate_thresholds(&sample, &limits()).is_empty());
    }

    #[test]
    fn test_all_metrics_over() {
        let sample = HostSample::new()
            .with(Metric::Cpu, 99.0)
            .with(Metric::Memory, 91.3)
            .with(Metric::Disk, 95.0)
            .with(Metric::Temperature, 71.5);
        let messages: Vec<String> = evaluate_thresholds(&sample, &limits())
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "High CPU usage: 99.0%",
                "High memory usage: 91.3%",
                "High disk usage: 95.0%",
                "High temperature: 71.5°C",
            ]
        );
    }

    #[test]
    fn test_metric_without_limit_never_alerts() {
        let sample = HostSample::new().with(Metric::Temperature, 120.0);
        let thresholds = BTreeMap::from([(Metric::Cpu, 85.0)]);
        assert!(evaluate_thresholds(&sample, &thresholds).is_empty());
    }

    #[test]
    fn test_sample_serializes_flat() {
        let sample = HostSample::new().with(Metric::Cpu, 12.0);
        let v = serde_json::to_value(&sample).unwrap();
        assert_eq!(v["cpu"], json!(12.0));
        assert!(v.get("timestamp").is_some());
        assert!(v.get("memory").is_none());
    }
}
