//! # Toolhost - Tool-Serving Runtime
//!
//! Serves schema-described tools to a client over a duplex byte stream:
//! - Tool catalog with per-tool input schemas and central argument validation
//! - Registry of handlers and whole integrations (`ToolProvider`)
//! - Dispatcher that turns every call, failing or not, into a result envelope
//! - Newline-delimited JSON-RPC 2.0 over stdin/stdout
//! - Background watchdog sampling host resources and dependent services
//!
//! ## Architecture
//!
//! ```text
//!   stdin  →  StdioServer  →  RequestDispatcher  →  ToolRegistry  →  handlers
//!   stdout ←  (JSON-RPC)   ←  ResultEnvelope     ←  normalize()   ←
//!
//!   Monitor (own task)  →  AlertSink (stderr lines)
//! ```
//!
//! Requests are processed one at a time. The monitor shares only its run
//! flag with the dispatch path.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod dispatch;
pub mod monitor;
pub mod tools;
pub mod transport;
pub mod types;

// Internal utilities
pub mod observability;

pub use dispatch::RequestDispatcher;
pub use types::{Config, Error, Result};
