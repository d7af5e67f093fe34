//! Stdio transport: newline-delimited JSON-RPC 2.0.

pub mod codec;
pub mod protocol;
pub mod server;

pub use codec::{read_frame, write_frame, Frame};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use server::StdioServer;
