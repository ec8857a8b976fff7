mod common;

use mcp_server_manager::McpClient;
use mcp_server_manager::error::Error;
use mcp_server_manager::transport::{HttpTransport, Transport};
use serde_json::json;
use std::time::Duration;

#[actix_web::test]
async fn test_session_lifecycle() {
    let mock = common::spawn_mock(&["numbers"]).await;
    let transport = HttpTransport::new("random", mock.endpoint(), Some(Duration::from_secs(5))).unwrap();

    assert_eq!(transport.session_id(), None);
    transport.initialize().await.unwrap();
    assert_eq!(transport.session_id().as_deref(), Some(common::SESSION_ID));

    transport.ping().await.unwrap();
    transport.close().await.unwrap();
    assert_eq!(transport.session_id(), None);

    mock.stop().await;
}

#[actix_web::test]
async fn test_requests_without_session_are_rejected() {
    let mock = common::spawn_mock(&["numbers"]).await;
    let transport = HttpTransport::new("random", mock.endpoint(), None).unwrap();

    // Skipping initialize means no session header is sent
    let result = transport.ping().await;
    match result {
        Err(Error::Transport(msg)) => assert!(msg.contains("400")),
        other => panic!("Expected Transport error, got: {:?}", other),
    }

    mock.stop().await;
}

#[actix_web::test]
async fn test_list_tools_follows_pagination() {
    let mock = common::spawn_mock(&["a", "b", "c", "d", "e"]).await;
    let transport = HttpTransport::new("letters", mock.endpoint(), None).unwrap();

    transport.initialize().await.unwrap();
    let tools = transport.list_tools().await.unwrap();
    transport.close().await.unwrap();

    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

    mock.stop().await;
}

#[actix_web::test]
async fn test_event_stream_responses() {
    let mock = common::spawn_sse_mock(&["numbers", "coin"]).await;
    let client = McpClient::new(
        "random".to_string(),
        HttpTransport::new("random", mock.endpoint(), None).unwrap(),
    );

    client.initialize().await.unwrap();
    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[1].name, "coin");

    let result = client.call_tool("numbers", json!({"count": 3})).await.unwrap();
    assert_eq!(result["content"][0]["text"], r#"{"count":3}"#);
    client.close().await.unwrap();

    mock.stop().await;
}

#[actix_web::test]
async fn test_tool_error_result_becomes_invocation_error() {
    let mock = common::spawn_mock(&["fail"]).await;
    let transport = HttpTransport::new("random", mock.endpoint(), None).unwrap();

    transport.initialize().await.unwrap();
    let result = transport.call_tool("fail", json!({})).await;
    transport.close().await.unwrap();

    match result {
        Err(Error::ToolInvocation(msg)) => assert_eq!(msg, "min_value must be less than max_value"),
        other => panic!("Expected ToolInvocation error, got: {:?}", other),
    }

    mock.stop().await;
}

#[actix_web::test]
async fn test_unknown_tool_is_invocation_error() {
    let mock = common::spawn_mock(&["numbers"]).await;
    let transport = HttpTransport::new("random", mock.endpoint(), None).unwrap();

    transport.initialize().await.unwrap();
    let result = transport.call_tool("missing", json!({})).await;

    match result {
        Err(Error::ToolInvocation(msg)) => assert!(msg.contains("Unknown tool: missing")),
        other => panic!("Expected ToolInvocation error, got: {:?}", other),
    }

    mock.stop().await;
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let port = std::net::TcpListener::bind(("127.0.0.1", 0))
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let transport = HttpTransport::new("gone", format!("http://127.0.0.1:{}/mcp", port), Some(Duration::from_secs(1))).unwrap();

    assert!(matches!(transport.initialize().await, Err(Error::Transport(_))));
    // Closing without a session is a no-op
    assert!(transport.close().await.is_ok());
}
