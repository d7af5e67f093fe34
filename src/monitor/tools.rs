//! Host monitoring and watchdog tools exposed over the protocol.

use crate::monitor::host::{ConnectionKind, HostInventory};
use crate::monitor::watchdog::Monitor;
use crate::tools::{Arguments, HandlerResult, ParamDef, ToolDescriptor, ToolOutput, ToolProvider};
use crate::types::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_PROCESS_LIMIT: u64 = 10;

/// Tool integration over a shared [`Monitor`] and the host's procfs.
#[derive(Debug, Clone)]
pub struct MonitorTools {
    monitor: Arc<Monitor>,
    inventory: HostInventory,
}

impl MonitorTools {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        let inventory = HostInventory::new().command_timeout(monitor.config().probe_timeout);
        Self::with_inventory(monitor, inventory)
    }

    pub fn with_inventory(monitor: Arc<Monitor>, inventory: HostInventory) -> Self {
        Self { monitor, inventory }
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Run a blocking inventory read off the async threads.
    async fn inspect<T, F>(&self, read: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&HostInventory) -> Result<T> + Send + 'static,
    {
        let inventory = self.inventory.clone();
        tokio::task::spawn_blocking(move || read(&inventory))
            .await
            .map_err(|e| Error::internal(format!("host inventory read failed: {}", e)))?
    }

    async fn system_status(&self) -> HandlerResult {
        let sample = self.monitor.sample().await?;
        let status = self
            .inspect(move |inventory| Ok(inventory.system_status(&sample)))
            .await?;
        Ok(ToolOutput::json(&status))
    }

    async fn processes(&self, args: &Arguments) -> HandlerResult {
        let limit = match args.get("limit") {
            None | Some(Value::Null) => DEFAULT_PROCESS_LIMIT,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| Error::validation("limit must be a non-negative integer"))?,
        };
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let processes = self.inspect(move |inventory| inventory.processes(limit)).await?;
        Ok(ToolOutput::json(&processes))
    }

    async fn network_connections(&self, args: &Arguments) -> HandlerResult {
        let kind: ConnectionKind = args
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("inet")
            .parse()?;
        let connections = self.inspect(move |inventory| inventory.connections(kind)).await?;
        Ok(ToolOutput::json(&connections))
    }

    fn start_watchdog(&self) -> ToolOutput {
        let (success, message) = match self.monitor.start() {
            Ok(()) => (true, "Watchdog started"),
            Err(e) => {
                tracing::debug!("start_watchdog refused: {}", e);
                (false, "Watchdog already running or disabled")
            }
        };
        ToolOutput::Json(json!({ "success": success, "message": message }))
    }

    fn stop_watchdog(&self) -> ToolOutput {
        let (success, message) = match self.monitor.stop() {
            Ok(()) => (true, "Watchdog stopped"),
            Err(e) => {
                tracing::debug!("stop_watchdog refused: {}", e);
                (false, "Watchdog was not running")
            }
        };
        ToolOutput::Json(json!({ "success": success, "message": message }))
    }
}

#[async_trait]
impl ToolProvider for MonitorTools {
    fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(
                "get_system_status",
                "Get comprehensive system status including CPU, memory, disk, network and temperature",
            ),
            ToolDescriptor::new(
                "get_processes",
                "Get list of running processes sorted by CPU usage",
            )
            .param(
                ParamDef::integer("limit", "Maximum number of processes to return")
                    .with_default(json!(DEFAULT_PROCESS_LIMIT)),
            ),
            ToolDescriptor::new("get_memory_details", "Get detailed memory usage information"),
            ToolDescriptor::new(
                "get_disk_usage",
                "Get disk usage for all mounted filesystems",
            ),
            ToolDescriptor::new("get_network_connections", "Get active network connections")
                .param(
                    ParamDef::string(
                        "kind",
                        "Connection type filter: inet, inet4, inet6, tcp, tcp4, tcp6, udp, udp4, udp6",
                    )
                    .with_enum(ConnectionKind::NAMES)
                    .with_default(json!("inet")),
                ),
            ToolDescriptor::new(
                "check_service_health",
                "Check health status of critical services",
            ),
            ToolDescriptor::new(
                "start_watchdog",
                "Start the system watchdog for continuous monitoring",
            ),
            ToolDescriptor::new("stop_watchdog", "Stop the system watchdog"),
            ToolDescriptor::new(
                "get_watchdog_status",
                "Get current watchdog status and configuration",
            ),
        ])
    }

    async fn invoke(&self, name: &str, args: Arguments) -> HandlerResult {
        match name {
            "get_system_status" => self.system_status().await,
            "get_processes" => self.processes(&args).await,
            "get_memory_details" => {
                let details = self.inspect(|inventory| inventory.memory_details()).await?;
                Ok(ToolOutput::json(&details))
            }
            "get_disk_usage" => {
                let partitions = self.inspect(|inventory| inventory.disk_usage()).await?;
                Ok(ToolOutput::json(&partitions))
            }
            "get_network_connections" => self.network_connections(&args).await,
            "check_service_health" => {
                let health = self.monitor.check_services().await;
                Ok(ToolOutput::json(&health))
            }
            "start_watchdog" => Ok(self.start_watchdog()),
            "stop_watchdog" => Ok(self.stop_watchdog()),
            "get_watchdog_status" => Ok(ToolOutput::json(&self.monitor.status())),
            _ => Err(Error::not_found(format!("Unknown tool: {}", name))),
        }
    }
}
