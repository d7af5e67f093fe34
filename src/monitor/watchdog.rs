//! Background watchdog: owned monitor state and its poll loop.
//!
//! A [`Monitor`] is either stopped or running. While running, a poller task
//! samples host metrics and probes dependent services every
//! `check_interval`, writing one alert line per breach to the [`AlertSink`].
//! A failing check is reported and the next one runs on schedule.

use crate::monitor::alert::{Alert, AlertSink, StderrAlertSink};
use crate::monitor::metrics::{evaluate_thresholds, HostSample};
use crate::monitor::probe::ServiceProber;
use crate::monitor::sampler::{HostSampler, ProcSampler};
use crate::types::{Error, MonitorConfig, Result};
use futures::FutureExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Extra time a host sample may take beyond the probe timeout (covers the
/// CPU measurement window).
const SAMPLE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Stopped,
    Running,
}

/// Snapshot returned by [`Monitor::status`].
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub running: bool,
    pub config: MonitorConfig,
    pub check_interval_seconds: u64,
    pub poller_alive: bool,
    pub last_service_health: BTreeMap<String, bool>,
}

struct Shared {
    config: MonitorConfig,
    running: AtomicBool,
    sampler: Arc<dyn HostSampler>,
    prober: ServiceProber,
    sink: Arc<dyn AlertSink>,
    last_service_health: Mutex<BTreeMap<String, bool>>,
}

struct Poller {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Watchdog over host resources and dependent services.
pub struct Monitor {
    shared: Arc<Shared>,
    poller: Mutex<Option<Poller>>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl Monitor {
    /// Monitor using the procfs sampler and stderr alerts.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let sampler = ProcSampler::new().command_timeout(config.probe_timeout);
        Self::with_parts(config, Arc::new(sampler), Arc::new(StderrAlertSink))
    }

    pub fn with_parts(
        config: MonitorConfig,
        sampler: Arc<dyn HostSampler>,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self> {
        let prober = ServiceProber::new(config.probe_timeout)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                running: AtomicBool::new(false),
                sampler,
                prober,
                sink,
                last_service_health: Mutex::new(BTreeMap::new()),
            }),
            poller: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> MonitorState {
        if self.is_running() {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    /// Stopped -> Running. Spawns the poller on the current tokio runtime.
    pub fn start(&self) -> Result<()> {
        if !self.shared.config.enabled {
            return Err(Error::state_transition("monitoring is disabled by configuration"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::internal(format!("no async runtime for the watchdog: {}", e)))?;
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::state_transition("watchdog is already running"));
        }

        let mut slot = self.lock_poller();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
        }
        let cancel = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(Arc::clone(&self.shared), cancel.clone()));
        *slot = Some(Poller { handle, cancel });
        tracing::info!(
            interval_secs = self.shared.config.check_interval_seconds(),
            "watchdog_started"
        );
        Ok(())
    }

    /// Running -> Stopped. The poller wakes immediately and exits.
    pub fn stop(&self) -> Result<()> {
        if self
            .shared
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::state_transition("watchdog is not running"));
        }
        if let Some(poller) = self.lock_poller().as_ref() {
            poller.cancel.cancel();
        }
        tracing::info!("watchdog_stopped");
        Ok(())
    }

    /// Stop if running and wait for the poller to finish.
    pub async fn shutdown(&self) {
        let _ = self.stop();
        let poller = self.lock_poller().take();
        if let Some(poller) = poller {
            poller.cancel.cancel();
            if let Err(e) = poller.handle.await {
                tracing::warn!("watchdog poller ended abnormally: {}", e);
            }
        }
    }

    /// Whether a poller task exists and has not finished.
    pub fn poller_alive(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .map(|p| !p.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn last_service_health(&self) -> BTreeMap<String, bool> {
        self.shared.lock_health().clone()
    }

    pub fn status(&self) -> MonitorStatus {
        let running = self.is_running();
        MonitorStatus {
            state: self.state(),
            running,
            config: self.shared.config.clone(),
            check_interval_seconds: self.shared.config.check_interval_seconds(),
            poller_alive: self.poller_alive(),
            last_service_health: self.last_service_health(),
        }
    }

    /// Take one host sample off the async threads.
    pub async fn sample(&self) -> Result<HostSample> {
        self.shared.sample().await
    }

    /// Probe all configured services once.
    pub async fn check_services(&self) -> BTreeMap<String, bool> {
        self.shared.check_services().await
    }

    /// Run one watchdog iteration now, emitting and returning its alerts.
    pub async fn check_once(&self) -> Result<Vec<Alert>> {
        self.shared.run_check().await
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        let slot = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(poller) = slot.take() {
            poller.cancel.cancel();
        }
    }
}

impl Shared {
    fn lock_health(&self) -> MutexGuard<'_, BTreeMap<String, bool>> {
        self.last_service_health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn sample(&self) -> Result<HostSample> {
        let sampler = Arc::clone(&self.sampler);
        let budget = self.config.probe_timeout + SAMPLE_GRACE;
        let task = tokio::task::spawn_blocking(move || sampler.sample());
        match tokio::time::timeout(budget, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(Error::internal(format!("host sampler failed: {}", join))),
            Err(_elapsed) => Err(Error::timeout(format!(
                "host sampling took longer than {:?}",
                budget
            ))),
        }
    }

    async fn check_services(&self) -> BTreeMap<String, bool> {
        let health = self.prober.probe_all(&self.config.services).await;
        *self.lock_health() = health.clone();
        health
    }

    async fn run_check(&self) -> Result<Vec<Alert>> {
        let sample = self.sample().await?;
        let mut alerts = evaluate_thresholds(&sample, &self.config.thresholds);

        let health = self.check_services().await;
        for service in &self.config.services {
            if health.get(&service.name) == Some(&false) {
                alerts.push(Alert::error(format!(
                    "Service {} is down or unreachable",
                    service.name
                )));
            }
        }

        for alert in &alerts {
            self.sink.emit(alert);
        }
        tracing::debug!(alerts = alerts.len(), "watchdog check complete");
        Ok(alerts)
    }
}

async fn poll_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    shared.sink.emit(&Alert::info("System watchdog started"));

    while !cancel.is_cancelled() && shared.running.load(Ordering::Acquire) {
        tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = AssertUnwindSafe(shared.run_check()).catch_unwind() => {
                let failure = match outcome {
                    Ok(Ok(_)) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(_panic) => Some("check panicked".to_string()),
                };
                if let Some(reason) = failure {
                    tracing::error!("watchdog_check_failed: {}", reason);
                    shared
                        .sink
                        .emit(&Alert::error(format!("Watchdog check failed: {}", reason)));
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(shared.config.check_interval) => {}
        }
    }

    shared.sink.emit(&Alert::info("System watchdog stopped"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::alert::AlertLevel;
    use crate::monitor::metrics::Metric;
    use crate::monitor::sampler::MockHostSampler;
    use crate::types::ServiceCheck;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<Alert>>);

    impl AlertSink for CollectingSink {
        fn emit(&self, alert: &Alert) {
            self.0.lock().unwrap().push(alert.clone());
        }
    }

    impl CollectingSink {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|a| a.message.clone()).collect()
        }
    }

    fn config(interval: Duration) -> MonitorConfig {
        MonitorConfig {
            check_interval: interval,
            probe_timeout: Duration::from_secs(2),
            services: Vec::new(),
            ..MonitorConfig::default()
        }
    }

    fn sampler_with_cpu(cpu: f64) -> Arc<MockHostSampler> {
        let mut sampler = MockHostSampler::new();
        sampler
            .expect_sample()
            .returning(move || Ok(HostSample::new().with(Metric::Cpu, cpu)));
        Arc::new(sampler)
    }

    async fn wait_for(sink: &CollectingSink, message: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !sink.messages().iter().any(|m| m == message) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("alert {:?} never arrived", message));
    }

    #[tokio::test]
    async fn test_start_stop_transitions() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(3600)), sampler_with_cpu(10.0), sink)
                .unwrap();
        assert_eq!(monitor.state(), MonitorState::Stopped);

        monitor.start().unwrap();
        assert_eq!(monitor.state(), MonitorState::Running);
        assert!(matches!(monitor.start(), Err(Error::StateTransition(_))));
        assert_eq!(monitor.state(), MonitorState::Running);

        monitor.stop().unwrap();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert!(matches!(monitor.stop(), Err(Error::StateTransition(_))));
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_disabled_monitor_refuses_start() {
        let cfg = MonitorConfig {
            enabled: false,
            ..config(Duration::from_secs(1))
        };
        let monitor =
            Monitor::with_parts(cfg, sampler_with_cpu(10.0), Arc::new(CollectingSink::default()))
                .unwrap();
        assert!(monitor.start().is_err());
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert!(!monitor.poller_alive());
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let monitor = Monitor::with_parts(
            config(Duration::from_secs(1)),
            sampler_with_cpu(10.0),
            Arc::new(CollectingSink::default()),
        )
        .unwrap();
        assert!(matches!(monitor.start(), Err(Error::Internal(_))));
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_cpu_over_threshold_emits_one_warning() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(1)), sampler_with_cpu(90.0), sink.clone())
                .unwrap();
        let alerts = monitor.check_once().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert!(alerts[0].message.contains("CPU"));
        assert_eq!(sink.messages(), vec!["High CPU usage: 90.0%".to_string()]);
    }

    #[tokio::test]
    async fn test_cpu_under_threshold_is_silent() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(1)), sampler_with_cpu(80.0), sink.clone())
                .unwrap();
        assert!(monitor.check_once().await.unwrap().is_empty());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_down_service_alerts_and_updates_health() {
        let sink = Arc::new(CollectingSink::default());
        let cfg = MonitorConfig {
            services: vec![
                ServiceCheck::command("up", "true", &[]),
                ServiceCheck::command("broken", "false", &[]),
            ],
            ..config(Duration::from_secs(1))
        };
        let monitor = Monitor::with_parts(cfg, sampler_with_cpu(10.0), sink.clone()).unwrap();

        let alerts = monitor.check_once().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Error);
        assert_eq!(alerts[0].message, "Service broken is down or unreachable");

        let health = monitor.last_service_health();
        assert_eq!(health.get("up"), Some(&true));
        assert_eq!(health.get("broken"), Some(&false));
    }

    #[tokio::test]
    async fn test_failing_checks_do_not_stop_poller() {
        let mut sampler = MockHostSampler::new();
        sampler
            .expect_sample()
            .returning(|| Err(Error::internal("sensor offline")));
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_millis(10)), Arc::new(sampler), sink.clone())
                .unwrap();

        monitor.start().unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let failures = sink
                    .messages()
                    .iter()
                    .filter(|m| m.starts_with("Watchdog check failed:"))
                    .count();
                if failures >= 3 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(monitor.poller_alive());
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_wakes_sleeping_poller() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(3600)), sampler_with_cpu(10.0), sink.clone())
                .unwrap();
        monitor.start().unwrap();
        wait_for(&sink, "System watchdog started").await;

        monitor.stop().unwrap();
        tokio::time::timeout(Duration::from_secs(2), monitor.shutdown())
            .await
            .unwrap();
        assert!(!monitor.poller_alive());
        assert_eq!(sink.messages().last().unwrap(), "System watchdog stopped");
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(3600)), sampler_with_cpu(10.0), sink.clone())
                .unwrap();
        monitor.start().unwrap();
        monitor.stop().unwrap();
        monitor.start().unwrap();
        assert!(monitor.poller_alive());
        assert_eq!(monitor.status().state, MonitorState::Running);
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_stops_poller() {
        let sink = Arc::new(CollectingSink::default());
        let monitor =
            Monitor::with_parts(config(Duration::from_secs(3600)), sampler_with_cpu(10.0), sink.clone())
                .unwrap();
        monitor.start().unwrap();
        wait_for(&sink, "System watchdog started").await;
        drop(monitor);
        wait_for(&sink, "System watchdog stopped").await;
    }

    #[tokio::test]
    async fn test_status_reports_config() {
        let monitor = Monitor::with_parts(
            config(Duration::from_secs(30)),
            sampler_with_cpu(10.0),
            Arc::new(CollectingSink::default()),
        )
        .unwrap();
        let status = monitor.status();
        assert_eq!(status.state, MonitorState::Stopped);
        assert_eq!(status.check_interval_seconds, 30);
        assert!(!status.poller_alive);
        let v = serde_json::to_value(&status).unwrap();
        assert_eq!(v["state"], "stopped");
        assert_eq!(v["config"]["thresholds"]["cpu"], 85.0);
    }
}
