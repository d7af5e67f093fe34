//! Host resource sampling.

use crate::monitor::command::output_within;
use crate::monitor::metrics::{HostSample, Metric};
use crate::types::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of host samples. Implementations may block; the monitor calls
/// them from the blocking pool.
#[cfg_attr(test, mockall::automock)]
pub trait HostSampler: Send + Sync {
    fn sample(&self) -> Result<HostSample>;
}

/// Linux sampler backed by procfs, sysfs and `df`.
#[derive(Debug, Clone)]
pub struct ProcSampler {
    proc_root: PathBuf,
    sys_root: PathBuf,
    cpu_window: Duration,
    disk_path: Option<PathBuf>,
    command_timeout: Duration,
}

impl Default for ProcSampler {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            cpu_window: Duration::from_secs(1),
            disk_path: Some(PathBuf::from("/")),
            command_timeout: Duration::from_secs(5),
        }
    }
}

impl ProcSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read procfs and sysfs from other roots.
    pub fn with_roots(proc_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            sys_root: sys_root.into(),
            ..Self::default()
        }
    }

    /// Interval between the two `/proc/stat` readings.
    pub fn cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    /// Filesystem whose usage is reported; `None` disables the disk metric.
    pub fn disk_path(mut self, path: Option<PathBuf>) -> Self {
        self.disk_path = path;
        self
    }

    /// Upper bound for `df`; a hung mount gives no disk figure.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!("cannot read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn cpu_percent(&self) -> Option<f64> {
        let stat = self.proc_root.join("stat");
        let before = parse_cpu_times(&self.read(&stat)?)?;
        std::thread::sleep(self.cpu_window);
        let after = parse_cpu_times(&self.read(&stat)?)?;
        cpu_usage(&before, &after)
    }

    fn memory_percent(&self) -> Option<f64> {
        parse_meminfo(&self.read(&self.proc_root.join("meminfo"))?)
    }

    fn disk_percent(&self) -> Option<f64> {
        let path = self.disk_path.as_ref()?.to_string_lossy();
        let output = output_within("df", &["-P", &path], self.command_timeout)?;
        parse_df(&output)
    }

    fn temperature_celsius(&self) -> Option<f64> {
        let path = self.sys_root.join("class/thermal/thermal_zone0/temp");
        parse_thermal(&self.read(&path)?)
    }
}

impl HostSampler for ProcSampler {
    fn sample(&self) -> Result<HostSample> {
        let mut sample = HostSample::new();
        let readings = [
            (Metric::Cpu, self.cpu_percent()),
            (Metric::Memory, self.memory_percent()),
            (Metric::Disk, self.disk_percent()),
            (Metric::Temperature, self.temperature_celsius()),
        ];
        for (metric, value) in readings {
            if let Some(value) = value {
                sample.set(metric, value);
            }
        }
        if sample.is_empty() {
            return Err(Error::internal("no host metrics could be read"));
        }
        Ok(sample)
    }
}

/// Aggregate jiffies from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 4 {
        return None;
    }
    // user nice system idle iowait irq softirq steal
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: fields.iter().sum(),
    })
}

/// Busy percentage between two readings; `None` if no time elapsed.
pub fn cpu_usage(before: &CpuTimes, after: &CpuTimes) -> Option<f64> {
    let total = after.total.checked_sub(before.total)?;
    let idle = after.idle.checked_sub(before.idle)?;
    if total == 0 {
        return None;
    }
    let busy = total.saturating_sub(idle);
    Some(busy as f64 / total as f64 * 100.0)
}

/// Used memory percentage: `(MemTotal - MemAvailable) / MemTotal`.
pub fn parse_meminfo(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find_map(|l| l.strip_prefix(name)?.strip_prefix(':'))
            .and_then(|rest| rest.split_whitespace().next()?.parse().ok())
    };
    let total = field("MemTotal")?;
    let available = field("MemAvailable").or_else(|| {
        Some(field("MemFree")? + field("Buffers").unwrap_or(0) + field("Cached").unwrap_or(0))
    })?;
    if total == 0 {
        return None;
    }
    Some(total.saturating_sub(available) as f64 / total as f64 * 100.0)
}

/// Used percentage from POSIX `df -P` output: `used / (used + available)`.
pub fn parse_df(output: &str) -> Option<f64> {
    let row = output.lines().nth(1)?;
    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let used: u64 = fields[2].parse().ok()?;
    let available: u64 = fields[3].parse().ok()?;
    let denom = used + available;
    if denom == 0 {
        return None;
    }
    Some(used as f64 / denom as f64 * 100.0)
}

/// Thermal zone reading in millidegrees Celsius.
pub fn parse_thermal(raw: &str) -> Option<f64> {
    let millis: i64 = raw.trim().parse().ok()?;
    Some(millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STAT_A: &str = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";
    const STAT_B: &str = "cpu  150 0 150 750 150 0 0 0 0 0\ncpu0 75 0 75 375 75 0 0 0 0 0\n";

    #[test]
    fn test_parse_cpu_times() {
        let t = parse_cpu_times(STAT_A).unwrap();
        assert_eq!(t, CpuTimes { idle: 800, total: 1000 });
    }

    #[test]
    fn test_cpu_usage_between_readings() {
        let a = parse_cpu_times(STAT_A).unwrap();
        let b = parse_cpu_times(STAT_B).unwrap();
        // 200 jiffies elapsed, 100 of them idle or iowait.
        assert_eq!(cpu_usage(&a, &b), Some(50.0));
        assert_eq!(cpu_usage(&a, &a), None);
    }

    #[test]
    fn test_parse_cpu_times_rejects_garbage() {
        assert!(parse_cpu_times("intr 1 2 3\n").is_none());
        assert!(parse_cpu_times("cpu  a b c d\n").is_none());
    }

    #[test]
    fn test_parse_meminfo() {
        let info = "MemTotal:       1000 kB\nMemFree:         100 kB\nMemAvailable:    250 kB\n";
        assert_eq!(parse_meminfo(info), Some(75.0));
    }

    #[test]
    fn test_parse_meminfo_without_available() {
        let info = "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 350 kB\n";
        assert_eq!(parse_meminfo(info), Some(50.0));
    }

    #[test]
    fn test_parse_df() {
        let out = "Filesystem     1024-blocks    Used Available Capacity Mounted on\n\
                   /dev/root         1000000  900000    100000      90% /\n";
        assert_eq!(parse_df(out), Some(90.0));
        assert_eq!(parse_df("Filesystem\n"), None);
    }

    #[test]
    fn test_parse_thermal() {
        assert_eq!(parse_thermal("48312\n"), Some(48.312));
        assert_eq!(parse_thermal("n/a"), None);
    }

    #[test]
    fn test_sample_from_fake_roots() {
        let proc_dir = tempfile::tempdir().unwrap();
        let sys_dir = tempfile::tempdir().unwrap();
        fs::write(proc_dir.path().join("stat"), STAT_A).unwrap();
        fs::write(
            proc_dir.path().join("meminfo"),
            "MemTotal: 2000 kB\nMemAvailable: 500 kB\n",
        )
        .unwrap();
        let zone = sys_dir.path().join("class/thermal/thermal_zone0");
        fs::create_dir_all(&zone).unwrap();
        fs::write(zone.join("temp"), "71000\n").unwrap();

        let sampler = ProcSampler::with_roots(proc_dir.path(), sys_dir.path())
            .cpu_window(Duration::ZERO)
            .disk_path(None);
        let sample = sampler.sample().unwrap();

        // Identical readings give no CPU figure.
        assert_eq!(sample.get(Metric::Cpu), None);
        assert_eq!(sample.get(Metric::Memory), Some(75.0));
        assert_eq!(sample.get(Metric::Disk), None);
        assert_eq!(sample.get(Metric::Temperature), Some(71.0));
    }

    #[test]
    fn test_sample_with_nothing_readable_fails() {
        let empty = tempfile::tempdir().unwrap();
        let sampler = ProcSampler::with_roots(empty.path(), empty.path())
            .cpu_window(Duration::ZERO)
            .disk_path(None);
        assert!(sampler.sample().is_err());
    }
}
