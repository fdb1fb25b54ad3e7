use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::ToolError;
use crate::tools::{ToolContext, ToolRegistry};

const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC front of the tool registry, shared by the stdio and HTTP
/// transports.
pub struct McpServer {
    name: String,
    registry: ToolRegistry,
    context: ToolContext,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry, context: ToolContext) -> Self {
        Self {
            name: name.into(),
            registry,
            context,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handles one raw message. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_message(value).await,
            Err(err) => Some(jsonrpc_error(
                None,
                -32700,
                &format!("parse error: {}", err),
            )),
        }
    }

    pub async fn handle_message(&self, value: Value) -> Option<Value> {
        let id = value.get("id").cloned();
        let Some(method) = value.get("method").and_then(|method| method.as_str()) else {
            return Some(jsonrpc_error(id, -32600, "invalid request"));
        };
        if id.is_none() {
            debug!("notification {}", method);
            return None;
        }
        let params = value.get("params").cloned().unwrap_or_else(|| json!({}));
        debug!("request {}", method);

        let response = match method {
            "initialize" => jsonrpc_response(id, self.initialize_result(&params)),
            "ping" => jsonrpc_response(id, json!({})),
            "tools/list" => jsonrpc_response(id, self.tools_list_result()),
            "tools/call" => match self.tools_call_result(&params).await {
                Ok(result) => jsonrpc_response(id, result),
                Err(err) => jsonrpc_error(id, -32602, &err.to_string()),
            },
            "resources/list" => jsonrpc_response(id, json!({ "resources": [] })),
            "prompts/list" => jsonrpc_response(id, json!({ "prompts": [] })),
            _ => jsonrpc_error(id, -32601, "method not found"),
        };
        Some(response)
    }

    fn initialize_result(&self, params: &Value) -> Value {
        let requested = params
            .get("protocolVersion")
            .and_then(|value| value.as_str())
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);
        json!({
            "protocolVersion": requested,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.name,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn tools_list_result(&self) -> Value {
        let tools = self
            .registry
            .descriptors()
            .iter()
            .map(|descriptor| {
                json!({
                    "name": descriptor.name,
                    "description": descriptor.description,
                    "inputSchema": descriptor.schema.to_json_schema()
                })
            })
            .collect::<Vec<_>>();
        json!({ "tools": tools })
    }

    async fn tools_call_result(&self, params: &Value) -> Result<Value, ToolError> {
        let name = params
            .get("name")
            .and_then(|value| value.as_str())
            .ok_or_else(|| ToolError::invalid_arguments("tool name is required"))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        info!("calling tool {}", name);
        let envelope = self.registry.dispatch(&self.context, name, &args).await?;
        serde_json::to_value(envelope).map_err(|err| ToolError::UpstreamError(err.to_string()))
    }
}

/// Newline-delimited JSON-RPC loop; stops when the reader reaches EOF.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(value) = server.handle_line(&line).await {
            let payload = serde_json::to_vec(&value)?;
            writer.write_all(&payload).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

pub async fn run_stdio(server: &McpServer) -> Result<()> {
    info!("serving {} tools over stdio", server.registry().descriptors().len());
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    serve(server, reader, tokio::io::stdout()).await
}

fn jsonrpc_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn jsonrpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}
