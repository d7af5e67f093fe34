//! Dependent service health probes.

use crate::types::{ProbeKind, Result, ServiceCheck};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

/// Runs configured service checks, each bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct ServiceProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl ServiceProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `true` iff the service answered healthy within the timeout.
    pub async fn probe(&self, check: &ServiceCheck) -> bool {
        let outcome = tokio::time::timeout(self.timeout, self.run(&check.probe)).await;
        match outcome {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(reason)) => {
                tracing::debug!(service = %check.name, "probe failed: {}", reason);
                false
            }
            Err(_elapsed) => {
                tracing::debug!(service = %check.name, "probe timed out after {:?}", self.timeout);
                false
            }
        }
    }

    /// Probe every check concurrently. Keys are service names.
    pub async fn probe_all(&self, checks: &[ServiceCheck]) -> BTreeMap<String, bool> {
        let results = join_all(checks.iter().map(|check| self.probe(check))).await;
        checks
            .iter()
            .map(|c| c.name.clone())
            .zip(results)
            .collect()
    }

    async fn run(&self, probe: &ProbeKind) -> std::result::Result<bool, String> {
        match probe {
            ProbeKind::Http { url } => {
                let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
                Ok(response.status() == reqwest::StatusCode::OK)
            }
            ProbeKind::Command { program, args } => {
                let status = tokio::process::Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .status()
                    .await
                    .map_err(|e| format!("{}: {}", program, e))?;
                Ok(status.success())
            }
        }
    }
}
