//! Request dispatcher: routes list and call requests to a tool provider.
//!
//! `handle_call` is the failure-containment boundary: unknown tools, invalid
//! arguments, handler errors and handler panics all come back as error
//! envelopes. Nothing raised by a single invocation escapes it.

use crate::tools::{normalize, Arguments, ErrorPayload, ResultEnvelope, ToolDescriptor, ToolProvider};
use crate::types::Result;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Dispatcher over any [`ToolProvider`].
#[derive(Debug)]
pub struct RequestDispatcher<P> {
    provider: P,
}

impl<P: ToolProvider> RequestDispatcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// List advertised tools. Failures are logged and returned; listing
    /// never degrades to an empty set.
    pub fn handle_list(&self) -> Result<Vec<ToolDescriptor>> {
        match self.provider.list_descriptors() {
            Ok(descriptors) => {
                tracing::debug!("listing {} tools", descriptors.len());
                Ok(descriptors)
            }
            Err(e) => {
                tracing::error!("error listing tools: {}", e);
                Err(e)
            }
        }
    }

    /// Call a tool with raw JSON arguments (`null` means no arguments).
    pub async fn handle_call_json(&self, name: &str, arguments: Value) -> ResultEnvelope {
        match arguments {
            Value::Null => self.handle_call(name, Arguments::new()).await,
            Value::Object(map) => self.handle_call(name, map).await,
            other => {
                tracing::warn!(tool = %name, "rejected non-object arguments");
                ErrorPayload::new(
                    name,
                    format!(
                        "validation error: arguments must be a JSON object, got {}",
                        json_kind(&other)
                    ),
                )
                .into_envelope()
            }
        }
    }

    /// Resolve, validate, execute, normalize.
    pub async fn handle_call(&self, name: &str, mut arguments: Arguments) -> ResultEnvelope {
        let Some(descriptor) = self.provider.lookup(name) else {
            tracing::warn!(tool = %name, "unknown tool requested");
            return ErrorPayload::new(name, format!("Unknown tool: {}", name)).into_envelope();
        };

        if let Err(e) = descriptor.prepare_arguments(&mut arguments) {
            tracing::warn!(tool = %name, "argument validation failed: {}", e);
            return ErrorPayload::new(name, e.to_string()).into_envelope();
        }

        tracing::info!(tool = %name, "tool_call");
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.provider.invoke(name, arguments))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(output)) => {
                tracing::debug!(tool = %name, elapsed_ms, "tool executed successfully");
                normalize(output)
            }
            Ok(Err(e)) => {
                tracing::error!(tool = %name, elapsed_ms, "error executing tool: {}", e);
                ErrorPayload::new(name, e.to_string()).into_envelope()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool = %name, elapsed_ms, "tool handler panicked: {}", message);
                ErrorPayload::new(name, format!("handler panicked: {}", message)).into_envelope()
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Tests
// =============================================================================
