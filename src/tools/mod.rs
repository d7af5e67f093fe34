//! Tool infrastructure: descriptors, the registry, content normalization,
//! error envelopes and the capability traits integrations implement.

pub mod builtin;
pub mod catalog;
pub mod content;
pub mod envelope;
pub mod provider;
pub mod registry;

pub use builtin::ExampleTools;
pub use catalog::{Arguments, ParamDef, ParamType, ToolDescriptor};
pub use content::{normalize, ContentBlock, ResultEnvelope, ToolOutput};
pub use envelope::ErrorPayload;
pub use provider::{handler_fn, FnHandler, HandlerResult, ToolHandler, ToolProvider};
pub use registry::ToolRegistry;
