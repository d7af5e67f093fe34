//! JSON-RPC 2.0 message shapes.

use crate::types::jsonrpc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision reported at `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Incoming request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": self.id,
                "error": {"code": jsonrpc::INTERNAL_ERROR, "message": e.to_string()},
            })
        })
    }
}

/// Outcome of decoding one line.
#[derive(Debug)]
pub enum Decoded {
    Request(JsonRpcRequest),
    /// Undecodable; the response to send back.
    Invalid(JsonRpcResponse),
}

/// Decode a line into a request, or the error response it deserves.
pub fn decode(line: &str) -> Decoded {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return Decoded::Invalid(JsonRpcResponse::error(
                Value::Null,
                jsonrpc::PARSE_ERROR,
                format!("Parse error: {}", e),
            ));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => Decoded::Request(request),
        Err(e) => Decoded::Invalid(JsonRpcResponse::error(
            id,
            jsonrpc::INVALID_REQUEST,
            format!("Invalid request: {}", e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        match decode(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#) {
            Decoded::Request(req) => {
                assert_eq!(req.method, "tools/list");
                assert_eq!(req.id, Some(json!(7)));
                assert!(!req.is_notification());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        match decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#) {
            Decoded::Request(req) => assert!(req.is_notification()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_is_parse_error() {
        match decode("not json") {
            Decoded::Invalid(resp) => {
                assert_eq!(resp.id, Value::Null);
                assert_eq!(resp.error.unwrap().code, jsonrpc::PARSE_ERROR);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_method_keeps_id() {
        match decode(r#"{"jsonrpc":"2.0","id":"a"}"#) {
            Decoded::Invalid(resp) => {
                assert_eq!(resp.id, json!("a"));
                assert_eq!(resp.error.unwrap().code, jsonrpc::INVALID_REQUEST);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_success_omits_error() {
        let v = JsonRpcResponse::success(json!(1), json!({})).to_value();
        assert!(v.get("error").is_none());
        assert_eq!(v["jsonrpc"], "2.0");
    }
}
