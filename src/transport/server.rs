//! Stdio server loop and JSON-RPC method routing.

use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::dispatch::RequestDispatcher;
use crate::tools::ToolProvider;
use crate::transport::codec::{read_frame, write_frame, Frame};
use crate::transport::protocol::{self, Decoded, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use crate::types::{jsonrpc, ServerConfig, TransportConfig};

/// JSON-RPC server over a duplex byte stream.
#[derive(Debug)]
pub struct StdioServer<P> {
    dispatcher: RequestDispatcher<P>,
    server: ServerConfig,
    transport: TransportConfig,
    cancel: CancellationToken,
}

impl<P: ToolProvider> StdioServer<P> {
    pub fn new(provider: P, server: ServerConfig, transport: TransportConfig) -> Self {
        Self {
            dispatcher: RequestDispatcher::new(provider),
            server,
            transport,
            cancel: CancellationToken::new(),
        }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher<P> {
        &self.dispatcher
    }

    /// Token that ends the read loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Serve the process's stdin/stdout until EOF, ctrl-c or shutdown.
    pub async fn serve_stdio(&self) -> std::io::Result<()> {
        let cancel = self.cancel.clone();
        let signal_watch = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => tracing::info!("interrupt received, shutting down"),
                        Err(e) => tracing::warn!("failed to listen for ctrl-c: {}", e),
                    }
                    cancel.cancel();
                }
            }
        });

        let result = self.serve(tokio::io::stdin(), tokio::io::stdout()).await;
        signal_watch.abort();
        result
    }

    /// Run the loop over any reader/writer pair. The writer is flushed on
    /// every exit path, including errors.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(reader);
        tracing::info!(
            "{} v{} serving on stdio (max_line_bytes={})",
            self.server.name,
            self.server.version,
            self.transport.max_line_bytes,
        );

        let result = self.run_loop(&mut reader, &mut writer).await;
        let flushed = writer.flush().await;
        if let Err(e) = &result {
            tracing::error!("stdio loop terminated: {}", e);
        }
        result.and(flushed)
    }

    async fn run_loop<R, W>(&self, reader: &mut BufReader<R>, writer: &mut W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let max_line_bytes = self.transport.max_line_bytes;
        loop {
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("stdio server shutting down");
                    break;
                }
                frame = read_frame(reader, max_line_bytes) => frame?,
            };

            let response = match frame {
                None => {
                    tracing::info!("input closed, stopping");
                    break;
                }
                Some(Frame::Oversized(len)) => {
                    tracing::warn!("rejected {} byte message (limit {})", len, max_line_bytes);
                    Some(JsonRpcResponse::error(
                        Value::Null,
                        jsonrpc::INVALID_REQUEST,
                        format!(
                            "Message of {} bytes exceeds limit of {} bytes",
                            len, max_line_bytes
                        ),
                    ))
                }
                Some(Frame::Line(line)) if line.trim().is_empty() => None,
                Some(Frame::Line(line)) => self.handle_line(&line).await,
            };

            if let Some(response) = response {
                write_frame(writer, &response.to_value()).await?;
            }
        }
        Ok(())
    }

    /// Handle one raw line. `None` means nothing is sent back.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match protocol::decode(line) {
            Decoded::Request(request) => self.handle_request(request).await,
            Decoded::Invalid(response) => {
                tracing::warn!("undecodable message: {:?}", response.error);
                Some(response)
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "notification received");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            other => {
                tracing::debug!(method = %other, "unknown method");
                Err((jsonrpc::METHOD_NOT_FOUND, format!("Method not found: {}", other)))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {
                "name": self.server.name,
                "version": self.server.version,
            },
        })
    }

    fn list_tools(&self) -> std::result::Result<Value, (i32, String)> {
        match self.dispatcher.handle_list() {
            Ok(descriptors) => {
                let tools: Vec<Value> = descriptors.iter().map(|d| d.to_wire()).collect();
                Ok(json!({ "tools": tools }))
            }
            Err(e) => Err((e.jsonrpc_code(), e.to_string())),
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, (i32, String)> {
        let mut params = match params {
            Some(Value::Object(map)) => map,
            _ => {
                return Err((
                    jsonrpc::INVALID_PARAMS,
                    "tools/call requires an object with a tool name".to_string(),
                ))
            }
        };
        let name = match params.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                return Err((
                    jsonrpc::INVALID_PARAMS,
                    "tools/call requires a string `name`".to_string(),
                ))
            }
        };
        let arguments = params.remove("arguments").unwrap_or(Value::Null);

        let envelope = self.dispatcher.handle_call_json(&name, arguments).await;
        Ok(envelope.to_wire())
    }
}
