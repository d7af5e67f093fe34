//! Minimal builtin integration: `echo` and `get_time`.

use crate::tools::catalog::{Arguments, ParamDef, ToolDescriptor};
use crate::tools::content::ToolOutput;
use crate::tools::provider::{HandlerResult, ToolProvider};
use crate::types::{Error, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Example integration, handy for smoke-testing a client connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleTools;

#[async_trait]
impl ToolProvider for ExampleTools {
    fn list_descriptors(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new("echo", "Echo back the input message")
                .param(ParamDef::string("message", "Message to echo").required()),
            ToolDescriptor::new("get_time", "Get current time"),
        ])
    }

    async fn invoke(&self, name: &str, args: Arguments) -> HandlerResult {
        match name {
            "echo" => {
                let message = args.get("message").and_then(|v| v.as_str()).unwrap_or("");
                Ok(ToolOutput::Text(format!("Echo: {}", message)))
            }
            "get_time" => Ok(ToolOutput::Json(json!({
                "time": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                "timezone": "UTC",
            }))),
            _ => Err(Error::not_found(format!("Unknown tool: {}", name))),
        }
    }
}
