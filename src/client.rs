//! Client module for talking to a running tool server.
//!
//! This module provides the `McpClient` type which wraps one session against a
//! server's control endpoint. It allows applications to:
//! - Probe liveness with a ping
//! - List the tools the server exposes
//! - Call a tool with JSON arguments
//!
//! The client is transport-agnostic and works with any implementation of the
//! `Transport` trait; the manager uses `HttpTransport`.

use crate::error::{Error, Result};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Represents a tool exposed by a server, with its metadata.
///
/// # Examples
///
/// ```
/// # use serde_json::json;
/// use mcp_server_manager::client::Tool;
///
/// let tool = Tool {
///     name: "numbers".to_string(),
///     description: "Generate a list of random integers.".to_string(),
///     input_schema: json!({
///         "type": "object",
///         "properties": {
///             "count": { "type": "integer", "default": 5 }
///         }
///     }),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name used when calling the tool.
    pub name: String,
    /// Human-readable description of the tool's purpose.
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the expected arguments.
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// A client session with a tool server.
///
/// # Examples
///
/// ```no_run
/// use mcp_server_manager::{McpClient, transport::HttpTransport, error::Result};
/// use serde_json::json;
///
/// # async fn example() -> Result<()> {
/// let transport = HttpTransport::new("random", "http://127.0.0.1:8765/mcp", None)?;
/// let client = McpClient::new("random".to_string(), transport);
///
/// client.initialize().await?;
///
/// for tool in client.list_tools().await? {
///     println!("Tool: {} - {}", tool.name, tool.description);
/// }
///
/// let output = client.call_tool("numbers", json!({ "count": 3 })).await?;
/// println!("Result: {}", output);
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct McpClient {
    /// Server name for identification.
    name: String,
    /// Transport implementation for communication.
    transport: Arc<dyn Transport>,
}

impl McpClient {
    /// Creates a new client with the specified name and transport.
    pub fn new(name: String, transport: impl Transport + 'static) -> Self {
        Self {
            name,
            transport: Arc::new(transport),
        }
    }

    /// Gets the name of the client (usually the same as the server name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens the session. Call before any other method.
    pub async fn initialize(&self) -> Result<()> {
        self.transport.initialize().await
    }

    /// Performs a no-op round trip.
    pub async fn ping(&self) -> Result<()> {
        self.transport.ping().await
    }

    /// Lists all tools provided by the server.
    ///
    /// Catalog entries that do not describe a tool are skipped.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let tools_json = self.transport.list_tools().await?;

        let mut tools = Vec::with_capacity(tools_json.len());
        for tool_value in tools_json {
            match serde_json::from_value(tool_value) {
                Ok(tool) => tools.push(tool),
                Err(e) => tracing::debug!(server = %self.name, error = %e, "Skipping malformed tool entry"),
            }
        }

        Ok(tools)
    }

    /// Calls a tool with a JSON object of arguments and returns the raw result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * `args` is neither an object nor null
    /// * The call fails in transit or on the server side
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let args = tool_arguments(args)?;
        self.transport.call_tool(name, args).await
    }

    /// Ends the session.
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }
}

/// Normalizes tool arguments: `null` becomes `{}`, other non-objects are rejected.
pub fn tool_arguments(args: Value) -> Result<Value> {
    match args {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(args),
        other => Err(Error::Serialization(format!(
            "Tool arguments must be a JSON object, got {}",
            other
        ))),
    }
}
