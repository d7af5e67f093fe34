//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file and then overridden from
//! `TOOLHOST_*` environment variables. Anything invalid is a fatal startup
//! error; nothing here is re-read once the dispatch loop is running.

use crate::monitor::Metric;
use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TOOLHOST_";

/// Global process configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server identity reported at `initialize`.
    #[serde(default)]
    pub server: ServerConfig,

    /// Stdio transport limits.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Background watchdog configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "toolhost".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Stdio transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Maximum accepted request line in bytes. Longer lines are rejected
    /// with an invalid-request response and the loop keeps serving.
    pub max_line_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Background watchdog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Master switch; `start()` refuses while disabled.
    pub enabled: bool,

    /// Start the watchdog before the dispatch loop begins.
    pub autostart: bool,

    /// Pause between two checks.
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,

    /// Upper bound for each individual service probe.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,

    /// Metric limits; a sample strictly above its limit raises an alert.
    /// Entries given in a file override the defaults one metric at a time.
    #[serde(deserialize_with = "merge_thresholds")]
    pub thresholds: BTreeMap<Metric, f64>,

    /// Dependent services probed on every check.
    pub services: Vec<ServiceCheck>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            autostart: true,
            check_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            thresholds: default_thresholds(),
            services: vec![
                ServiceCheck::command("docker", "docker", &["ps"]),
                ServiceCheck::http("qdrant", "http://localhost:6333/healthz"),
                ServiceCheck::command(
                    "postgresql",
                    "docker",
                    &["exec", "postgres", "pg_isready", "-U", "postgres"],
                ),
                ServiceCheck::http("embeddings", "http://localhost:8001/health"),
            ],
        }
    }
}

fn default_thresholds() -> BTreeMap<Metric, f64> {
    BTreeMap::from([
        (Metric::Cpu, 85.0),
        (Metric::Memory, 80.0),
        (Metric::Disk, 90.0),
        (Metric::Temperature, 70.0),
    ])
}

fn merge_thresholds<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Metric, f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let overrides = BTreeMap::<Metric, f64>::deserialize(deserializer)?;
    let mut thresholds = default_thresholds();
    thresholds.extend(overrides);
    Ok(thresholds)
}

impl MonitorConfig {
    /// Check interval in whole seconds, as reported by watchdog status.
    pub fn check_interval_seconds(&self) -> u64 {
        self.check_interval.as_secs()
    }
}

/// A named dependent service and how to probe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheck {
    pub name: String,
    pub probe: ProbeKind,
}

/// Probe mechanism for a dependent service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    /// Healthy iff a GET returns 200.
    Http { url: String },
    /// Healthy iff the command exits successfully.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl ServiceCheck {
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe: ProbeKind::Http { url: url.into() },
        }
    }

    pub fn command(name: impl Into<String>, program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            probe: ProbeKind::Command {
                program: program.into(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Config {
    /// Load a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid config {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (keys include the prefix).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(v) = var("SERVER_NAME") {
            self.server.name = v;
        }
        if let Some(v) = var("MAX_LINE_BYTES") {
            self.transport.max_line_bytes = parse_env("MAX_LINE_BYTES", &v)?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.observability.log_level = v;
        }
        if let Some(v) = var("MONITOR_ENABLED") {
            self.monitor.enabled = parse_bool("MONITOR_ENABLED", &v)?;
        }
        if let Some(v) = var("MONITOR_AUTOSTART") {
            self.monitor.autostart = parse_bool("MONITOR_AUTOSTART", &v)?;
        }
        if let Some(v) = var("CHECK_INTERVAL_SECS") {
            self.monitor.check_interval = Duration::from_secs(parse_env("CHECK_INTERVAL_SECS", &v)?);
        }
        if let Some(v) = var("PROBE_TIMEOUT_SECS") {
            self.monitor.probe_timeout = Duration::from_secs(parse_env("PROBE_TIMEOUT_SECS", &v)?);
        }

        for (metric, suffix) in [
            (Metric::Cpu, "CPU_THRESHOLD"),
            (Metric::Memory, "MEMORY_THRESHOLD"),
            (Metric::Disk, "DISK_THRESHOLD"),
            (Metric::Temperature, "TEMP_THRESHOLD"),
        ] {
            if let Some(v) = var(suffix) {
                self.monitor.thresholds.insert(metric, parse_env(suffix, &v)?);
            }
        }

        Ok(())
    }

    /// Reject configurations the runtime cannot serve with.
    pub fn validate(&self) -> Result<()> {
        if self.server.name.trim().is_empty() {
            return Err(Error::config("server.name cannot be empty"));
        }
        if self.transport.max_line_bytes == 0 {
            return Err(Error::config("transport.max_line_bytes must be positive"));
        }
        if self.monitor.check_interval.is_zero() {
            return Err(Error::config("monitor.check_interval must be positive"));
        }
        if self.monitor.probe_timeout.is_zero() {
            return Err(Error::config("monitor.probe_timeout must be positive"));
        }
        for (metric, limit) in &self.monitor.thresholds {
            if !limit.is_finite() || *limit < 0.0 {
                return Err(Error::config(format!(
                    "threshold for {} must be a non-negative number, got {}",
                    metric, limit
                )));
            }
        }

        let mut seen = HashSet::new();
        for service in &self.monitor.services {
            if service.name.trim().is_empty() {
                return Err(Error::config("service name cannot be empty"));
            }
            if !seen.insert(service.name.as_str()) {
                return Err(Error::config(format!("duplicate service: {}", service.name)));
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("{}{}={:?}: {}", ENV_PREFIX, key, raw, e)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!(
            "{}{}={:?}: expected a boolean",
            ENV_PREFIX, key, raw
        ))),
    }
}
