//! Newline-delimited JSON-RPC server over stdio.
//!
//! Requests are handled one at a time in arrival order. Stdout carries only
//! protocol messages, so all logging goes to stderr.

use crate::error::ToolError;
use crate::protocol::{
    CallToolParams, JsonRpcRequest, JsonRpcResponse, ToolResponse, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, LATEST_PROTOCOL_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "lingo-repo-agent";

pub struct Server {
    name: String,
    version: String,
    registry: ToolRegistry,
}

impl Server {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve until the reader reaches EOF
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("{} {} ready on stdio", self.name, self.version);

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let encoded = match serde_json::to_string(&response) {
                    Ok(encoded) => encoded,
                    Err(e) => {
                        error!("Failed to encode response: {}", e);
                        continue;
                    }
                };
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one raw message. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                    None,
                ));
            }
        };

        let id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                    None,
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                None,
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }

        Some(self.handle_request(id, request).await)
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => {
                info!("Client is ready");
            }
            "notifications/cancelled" => {
                debug!("Ignoring cancellation, calls run to completion");
            }
            _ => {
                debug!("Received unknown notification: {}", method);
            }
        }
    }

    async fn handle_request(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => {
                info!("Received initialization request");
                let version = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(LATEST_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": version,
                        "capabilities": { "tools": {} },
                        "serverInfo": { "name": self.name, "version": self.version },
                    }),
                )
            }
            "tools/list" => {
                debug!("Received tools list request");
                JsonRpcResponse::success(id, json!({ "tools": self.registry.list() }))
            }
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                    None,
                )
            }
        }
    }

    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value::<CallToolParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid tools/call params: {}", e),
                    None,
                )
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    "Missing tools/call params",
                    None,
                )
            }
        };

        let arguments = params.arguments.unwrap_or(Value::Null);
        match self.registry.call(&params.name, &arguments).await {
            Ok(response) => tool_result(id, &response),
            Err(e) if e.is_invalid_request() => invalid_params(id, &e),
            Err(e) => {
                error!("Tool {} failed: {}", params.name, e);
                tool_result(id, &ToolResponse::failure(&e))
            }
        }
    }
}

fn tool_result(id: Value, response: &ToolResponse) -> JsonRpcResponse {
    match serde_json::to_value(response) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e), None),
    }
}

/// Bad requests are protocol errors, distinct from tool results
fn invalid_params(id: Value, error: &ToolError) -> JsonRpcResponse {
    let errors: Vec<Value> = match error {
        ToolError::Validation(fields) => fields
            .iter()
            .map(|f| json!({ "field": f.field, "message": f.message }))
            .collect(),
        _ => Vec::new(),
    };

    JsonRpcResponse::error(
        id,
        INVALID_PARAMS,
        error.to_string(),
        Some(json!({ "kind": error.kind(), "stage": error.stage().as_str(), "errors": errors })),
    )
}
