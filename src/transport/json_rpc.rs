//! JSON-RPC 2.0 envelopes for the MCP control endpoint.
//!
//! Only the client side is modelled: outgoing requests and notifications,
//! incoming responses.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

pub const JSON_RPC_VERSION: &str = "2.0";

/// MCP protocol revision announced during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// Outgoing call that expects a response with the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Opens a session, announcing `client_name` and this crate's version.
    pub fn initialize(id: impl Into<Value>, client_name: &str) -> Self {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": client_name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        Self::new(id, "initialize", Some(params))
    }

    pub fn ping(id: impl Into<Value>) -> Self {
        Self::new(id, "ping", None)
    }

    /// `tools/list`, continuing from `cursor` when paging.
    pub fn list_tools(id: impl Into<Value>, cursor: Option<&str>) -> Self {
        Self::new(
            id,
            "tools/list",
            cursor.map(|cursor| json!({ "cursor": cursor })),
        )
    }

    pub fn call_tool(id: impl Into<Value>, name: impl Into<String>, args: Value) -> Self {
        Self::new(
            id,
            "tools/call",
            Some(json!({ "name": name.into(), "arguments": args })),
        )
    }
}

/// Outgoing message without an `id`; the server sends no response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// Sent once after `initialize` succeeds.
    pub fn initialized() -> Self {
        Self::new("notifications/initialized", None)
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Incoming answer to a [`JsonRpcRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// The result payload, or the error object as `Error::JsonRpc`.
    ///
    /// A response with neither member counts as an empty object, which is
    /// what `ping` returns.
    pub fn into_result(self) -> Result<Value> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(Error::JsonRpc(error.message)),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Object(Default::default())),
        }
    }
}
