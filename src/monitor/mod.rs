//! Host and service watchdog.
//!
//! - **alert**: alert lines and the sink they are written to
//! - **command**: external commands bounded by a deadline
//! - **host**: procfs inventory (processes, memory, partitions, sockets)
//! - **metrics**: host metrics, samples and threshold evaluation
//! - **sampler**: the `HostSampler` seam and its procfs implementation
//! - **probe**: HTTP and command health probes
//! - **watchdog**: the `Monitor` state machine and poll loop
//! - **tools**: protocol tools over a `Monitor` and the host inventory

pub mod alert;
pub mod command;
pub mod host;
pub mod metrics;
pub mod probe;
pub mod sampler;
pub mod tools;
pub mod watchdog;

pub use alert::{Alert, AlertLevel, AlertSink, StderrAlertSink};
pub use host::{
    Connection, ConnectionKind, DiskPartition, HostInventory, MemoryDetails, ProcessInfo,
    SystemStatus,
};
pub use metrics::{evaluate_thresholds, HostSample, Metric};
pub use probe::ServiceProber;
pub use sampler::{HostSampler, ProcSampler};
pub use tools::MonitorTools;
pub use watchdog::{Monitor, MonitorState, MonitorStatus};
