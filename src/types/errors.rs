//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC 2.0 error codes used by the stdio transport.
pub mod jsonrpc {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Main error enum for the tool host.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed tool arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown tool, method, or resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// A tool handler (or the collaborator behind it) failed.
    #[error("{0}")]
    Handler(String),

    /// Invalid state transition (e.g. starting a running watchdog).
    #[error("state transition error: {0}")]
    StateTransition(String),

    /// Invalid or missing startup configuration. Fatal before serving.
    #[error("configuration error: {0}")]
    Config(String),

    /// A bounded operation ran out of time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Internal errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client errors.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map to the JSON-RPC error code used when this error surfaces at the
    /// protocol level (only listing and framing failures do).
    pub fn jsonrpc_code(&self) -> i32 {
        match self {
            Error::Validation(_) => jsonrpc::INVALID_PARAMS,
            Error::NotFound(_) => jsonrpc::METHOD_NOT_FOUND,
            Error::Serialization(_) => jsonrpc::PARSE_ERROR,
            Error::Handler(_)
            | Error::StateTransition(_)
            | Error::Config(_)
            | Error::Timeout(_)
            | Error::Internal(_)
            | Error::Http(_)
            | Error::Io(_) => jsonrpc::INTERNAL_ERROR,
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    pub fn state_transition(msg: impl Into<String>) -> Self {
        Self::StateTransition(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
