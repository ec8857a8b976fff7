//! Transports carrying MCP requests to a tool server's control endpoint.
//!
//! [`Transport`] is the seam between [`McpClient`](crate::McpClient) and the
//! wire; [`HttpTransport`] speaks JSON-RPC over the streamable-HTTP surface
//! every launched server exposes.
mod http;
mod json_rpc;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use http::HttpTransport;
pub use json_rpc::{
    JSON_RPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    MCP_PROTOCOL_VERSION,
};

/// One client session against a control endpoint.
///
/// `initialize` opens the session and `close` ends it; the other calls are
/// only meaningful in between.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the session.
    async fn initialize(&self) -> Result<()>;

    /// No-op round trip used as a liveness probe.
    async fn ping(&self) -> Result<()>;

    /// Raw tool catalog entries.
    async fn list_tools(&self) -> Result<Vec<Value>>;

    /// Calls a tool and returns its raw result.
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value>;

    /// Ends the session.
    async fn close(&self) -> Result<()>;
}
