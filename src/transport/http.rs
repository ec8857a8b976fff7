use super::Transport;
use super::json_rpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Header carrying the server-assigned session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

const ACCEPT_JSON_OR_SSE: &str = "application/json, text/event-stream";

/// HttpTransport talks to a tool server's streamable-HTTP control endpoint.
///
/// Each JSON-RPC message is one `POST`. The server may answer with a plain
/// JSON body or with a short event stream whose `data:` lines carry the
/// response; both are handled. The session id handed out on `initialize`
/// is echoed on every later request and released with a `DELETE` on close.
///
/// # Example
///
/// ```no_run
/// use mcp_server_manager::transport::{HttpTransport, Transport};
/// use mcp_server_manager::error::Result;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let transport = HttpTransport::new("random", "http://127.0.0.1:8765/mcp", None)?;
///
///     transport.initialize().await?;
///     let tools = transport.list_tools().await?;
///     println!("Available tools: {:?}", tools);
///     transport.close().await?;
///
///     Ok(())
/// }
/// ```
pub struct HttpTransport {
    /// Server name
    name: String,
    /// Full endpoint URL
    endpoint: String,
    /// HTTP client
    http: reqwest::Client,
    /// Session id assigned by the server
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    /// Creates a transport for `endpoint`.
    ///
    /// `timeout` bounds every HTTP exchange; `None` waits indefinitely.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            endpoint: endpoint.into(),
            http,
            session_id: Mutex::new(None),
        })
    }

    /// Gets the name of the server associated with this transport.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Session id assigned by the server, if any.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    fn store_session_id(&self, response: &reqwest::Response) -> Result<()> {
        let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
        else {
            return Ok(());
        };

        let mut guard = self
            .session_id
            .lock()
            .map_err(|_| Error::Transport("Failed to lock session id".to_string()))?;
        *guard = Some(session.to_string());
        Ok(())
    }

    async fn post(&self, body: &impl Serialize) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, ACCEPT_JSON_OR_SSE)
            .json(body);
        if let Some(session) = self.session_id() {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await.map_err(|e| {
            Error::Transport(format!("Request to {} failed: {}", self.endpoint, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "{} returned HTTP {}: {}",
                self.endpoint,
                status,
                body.trim()
            )));
        }

        Ok(response)
    }

    /// Sends a JSON-RPC request and returns the matching response.
    pub async fn send_request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        tracing::trace!(server = %self.name, method = %request.method, "Sending request");
        let response = self.post(&request).await?;
        self.store_session_id(&response)?;

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

        if is_event_stream {
            parse_event_stream(&body, &request.id).ok_or_else(|| {
                Error::Transport(format!(
                    "No response to '{}' in event stream",
                    request.method
                ))
            })
        } else {
            serde_json::from_str(&body)
                .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
        }
    }

    /// Sends a JSON-RPC notification (no response expected).
    pub async fn send_notification(&self, notification: JsonRpcNotification) -> Result<()> {
        tracing::trace!(server = %self.name, method = %notification.method, "Sending notification");
        self.post(&notification).await.map(|_| ())
    }

    async fn request(&self, request: JsonRpcRequest) -> Result<Value> {
        self.send_request(request).await?.into_result()
    }
}

/// Finds the response with `id` among the `data:` payloads of an event stream.
pub(crate) fn parse_event_stream(body: &str, id: &Value) -> Option<JsonRpcResponse> {
    let normalized = body.replace("\r\n", "\n");

    for event in normalized.split("\n\n") {
        let data = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|payload| payload.strip_prefix(' ').unwrap_or(payload))
            .collect::<Vec<_>>()
            .join("\n");

        if data.is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonRpcResponse>(&data) {
            Ok(response) if &response.id == id => return Some(response),
            _ => continue,
        }
    }

    None
}

/// Joins the `text` entries of a tool result's `content` array.
fn content_text(result: &Value) -> String {
    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if texts.is_empty() {
        result.to_string()
    } else {
        texts.join("\n")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn initialize(&self) -> Result<()> {
        let request = JsonRpcRequest::initialize(Uuid::new_v4().to_string(), env!("CARGO_PKG_NAME"));
        let result = self.request(request).await?;
        tracing::debug!(
            server = %self.name,
            session = ?self.session_id(),
            protocol = ?result.get("protocolVersion"),
            "Session initialized"
        );

        self.send_notification(JsonRpcNotification::initialized()).await
    }

    async fn ping(&self) -> Result<()> {
        self.request(JsonRpcRequest::ping(Uuid::new_v4().to_string()))
            .await
            .map(|_| ())
    }

    async fn list_tools(&self) -> Result<Vec<Value>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = JsonRpcRequest::list_tools(Uuid::new_v4().to_string(), cursor.as_deref());
            let result = self.request(request).await?;

            if let Some(Value::Array(page)) = result.get("tools") {
                tools.extend(page.iter().cloned());
            }

            match result.get("nextCursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => cursor = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(tools)
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let request = JsonRpcRequest::call_tool(Uuid::new_v4().to_string(), name, args);
        let result = self
            .request(request)
            .await
            .map_err(|e| Error::ToolInvocation(e.to_string()))?;

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(Error::ToolInvocation(content_text(&result)));
        }

        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        let session = self
            .session_id
            .lock()
            .map_err(|_| Error::Transport("Failed to lock session id".to_string()))?
            .take();

        if let Some(session) = session {
            let outcome = self
                .http
                .delete(&self.endpoint)
                .header(SESSION_HEADER, &session)
                .send()
                .await;
            // Servers may refuse explicit termination; the session then expires on its own.
            if let Err(e) = outcome {
                tracing::debug!(server = %self.name, error = %e, "Failed to end session");
            }
        }

        Ok(())
    }
}
