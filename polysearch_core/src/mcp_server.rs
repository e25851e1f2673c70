use std::sync::Arc;

use rmcp::model::*;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::SearchError;
use crate::tools::{call_search_tool, list_search_tools};

/// MCP server exposing the search dispatcher as one tool.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
    /// `clientInfo.name` from `initialize`, forwarded as the caller id.
    client_name: Mutex<Option<String>>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            client_name: Mutex::new(None),
        }
    }

    pub fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
            ..Default::default()
        }
    }

    pub async fn handle_initialize(&self, params: &Value) -> InitializeResult {
        let client = params
            .get("clientInfo")
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .map(str::to_string);
        info!(client = client.as_deref().unwrap_or("unknown"), "MCP server initializing");
        *self.client_name.lock().await = client;

        InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.capabilities(),
            server_info: Implementation {
                name: "polysearch".to_string(),
                title: Some("Polysearch".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Web search across Brave and search-grounded LLM providers. Call web_search with an engine and a query.".to_string(),
            ),
        }
    }

    pub fn handle_list_tools(&self) -> ListToolsResult {
        let tools = list_search_tools(&self.dispatcher.credentials());
        if tools.is_empty() {
            warn!("no search engines configured; exposing no tools");
        }
        ListToolsResult {
            tools,
            next_cursor: None,
        }
    }

    pub async fn handle_call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, SearchError> {
        let caller = self.client_name.lock().await.clone();
        call_search_tool(&self.dispatcher, request, caller.as_deref()).await
    }
}

/// JSON-RPC 2.0 framing around [`McpServer`].
pub struct JsonRpcHandler {
    server: McpServer,
}

impl JsonRpcHandler {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }

    /// Handle one decoded message. Notifications (no `id`) yield `None`.
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let Some(id) = request.get("id").cloned() else {
            debug!(method, "notification");
            return None;
        };
        debug!(method, "request");
        let params = request.get("params").cloned().unwrap_or(json!({}));

        let result = match method {
            "initialize" => to_value(self.server.handle_initialize(&params).await),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(self.server.handle_list_tools()),
            "tools/call" => match serde_json::from_value::<CallToolRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_call_tool(req)
                    .await
                    .map_err(|e| e.to_jsonrpc_error())
                    .and_then(to_value),
                Err(e) => Err(json!({
                    "code": -32602,
                    "message": format!("Invalid params: {}", e),
                })),
            },
            _ => Err(json!({
                "code": -32601,
                "message": format!("Method not found: {}", method),
            })),
        };

        Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": id,
            }),
        })
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, Value> {
    serde_json::to_value(value).map_err(|e| SearchError::from(e).to_jsonrpc_error())
}
