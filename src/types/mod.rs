//! Core types for the tool host.
//!
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for server, transport, and watchdog

mod config;
mod errors;

pub use config::{
    Config, MonitorConfig, ObservabilityConfig, ProbeKind, ServerConfig, ServiceCheck,
    TransportConfig, ENV_PREFIX,
};
pub use errors::{jsonrpc, Error, Result};
