#![allow(dead_code)]

//! In-process MCP control endpoint used by the integration tests.

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

pub const SESSION_ID: &str = "mock-session";

/// Tools returned per `tools/list` page, so catalogs above this size paginate.
const PAGE_SIZE: usize = 2;

struct MockState {
    tools: Vec<Value>,
    event_stream: bool,
}

/// A running mock server; stopped when dropped by the test runtime.
pub struct MockServer {
    pub port: u16,
    handle: ServerHandle,
}

impl MockServer {
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}/mcp", self.port)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

pub fn tool(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} tool", name),
        "inputSchema": {"type": "object", "properties": {}}
    })
}

/// Starts a mock answering with plain JSON bodies.
pub async fn spawn_mock(tools: &[&str]) -> MockServer {
    spawn(tools, false).await
}

/// Starts a mock answering every request with a `text/event-stream` body.
pub async fn spawn_sse_mock(tools: &[&str]) -> MockServer {
    spawn(tools, true).await
}

async fn spawn(tools: &[&str], event_stream: bool) -> MockServer {
    let state = web::Data::new(MockState {
        tools: tools.iter().map(|name| tool(name)).collect(),
        event_stream,
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/mcp", web::post().to(handle_post))
            .route("/mcp", web::delete().to(handle_delete))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let port = server.addrs()[0].port();
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    MockServer { port, handle }
}

async fn handle_delete() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn handle_post(req: HttpRequest, state: web::Data<MockState>, body: web::Json<Value>) -> HttpResponse {
    let method = body.get("method").and_then(Value::as_str).unwrap_or_default();

    // Notifications carry no id and get no body
    let Some(id) = body.get("id").cloned() else {
        return HttpResponse::Accepted().finish();
    };

    if method != "initialize" {
        let session = req
            .headers()
            .get("mcp-session-id")
            .and_then(|value| value.to_str().ok());
        if session != Some(SESSION_ID) {
            return HttpResponse::BadRequest().body("missing session");
        }
    }

    let params = body.get("params").cloned().unwrap_or(Value::Null);
    let message = match method {
        "initialize" => success(
            &id,
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "mock", "version": "0.1.0"}
            }),
        ),
        "ping" => success(&id, json!({})),
        "tools/list" => {
            let offset = params
                .get("cursor")
                .and_then(Value::as_str)
                .and_then(|cursor| cursor.parse::<usize>().ok())
                .unwrap_or(0);
            let page: Vec<Value> = state.tools.iter().skip(offset).take(PAGE_SIZE).cloned().collect();
            let mut result = json!({ "tools": page });
            if offset + PAGE_SIZE < state.tools.len() {
                result["nextCursor"] = json!((offset + PAGE_SIZE).to_string());
            }
            success(&id, result)
        }
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
            if name == "fail" {
                success(
                    &id,
                    json!({
                        "content": [{"type": "text", "text": "min_value must be less than max_value"}],
                        "isError": true
                    }),
                )
            } else if state.tools.iter().any(|tool| tool["name"] == name) {
                success(
                    &id,
                    json!({
                        "content": [{"type": "text", "text": arguments.to_string()}],
                        "isError": false
                    }),
                )
            } else {
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32602, "message": format!("Unknown tool: {}", name)}
                })
            }
        }
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        }),
    };

    let mut response = HttpResponse::Ok();
    if method == "initialize" {
        response.insert_header(("mcp-session-id", SESSION_ID));
    }

    if state.event_stream {
        response
            .content_type("text/event-stream")
            .body(format!("event: message\ndata: {}\n\n", message))
    } else {
        response.json(message)
    }
}

fn success(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}
