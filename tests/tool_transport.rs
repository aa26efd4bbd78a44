use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use supportchat::mcp::{ToolBackend, ToolClient, ToolResult};
use supportchat::SupportChatError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn request_id(request: &Request) -> String {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    body["id"].as_str().unwrap().to_string()
}

fn sse_body(documents: &[Value]) -> String {
    documents
        .iter()
        .map(|doc| format!("event: message\ndata: {}\n\n", doc))
        .collect()
}

fn client_for(server: &MockServer) -> ToolClient {
    ToolClient::new(&format!("{}/mcp", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn json_reply_loads_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(header("cache-control", "no-cache"))
        .and(body_partial_json(json!({"jsonrpc": "2.0", "method": "tools/list"})))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": request_id(request),
                "result": {"tools": [
                    {"name": "search_products", "description": "Search the catalog",
                     "inputSchema": {"type": "object", "properties": {"query": {"type": "string"}}}},
                    {"name": "get_order"}
                ]}
            }))
        })
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.list_tools().await.is_empty());
    client.initialize().await.unwrap();

    let tools = client.list_tools().await;
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "search_products");
    assert_eq!(tools[1].description, None);
    assert!(client.is_initialized().await);
}

#[tokio::test]
async fn event_stream_skips_other_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(|request: &Request| {
            let body = sse_body(&[
                json!({"jsonrpc": "2.0", "id": "someone-else", "result": {"x": 0}}),
                json!({"jsonrpc": "2.0", "id": request_id(request), "result": {"x": 1}}),
            ]);
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
        })
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call_tool("lookup", json!({}))
        .await
        .unwrap();
    assert_eq!(result, ToolResult::Structured(json!({"x": 1})));
}

#[tokio::test]
async fn event_stream_without_match_names_the_method() {
    let server = MockServer::start().await;
    let body = sse_body(&[json!({"jsonrpc": "2.0", "id": "someone-else", "result": {}})]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let err = client_for(&server).initialize().await.unwrap_err();
    assert!(matches!(err, SupportChatError::NoResponse { .. }));
    assert_eq!(err.to_string(), "No response received for method tools/list");
}

#[tokio::test]
async fn error_reply_fails_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": request_id(request),
                "error": {"code": -32602, "message": "unknown tool"}
            }))
        })
        .mount(&server)
        .await;

    let err = client_for(&server)
        .call_tool("missing", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, SupportChatError::ToolExecution { ref tool, .. } if tool == "missing"));
    assert!(err.to_string().contains("unknown tool"));
}

#[tokio::test]
async fn server_error_sentinel_is_reported() {
    let server = MockServer::start().await;
    let body = sse_body(&[json!({
        "jsonrpc": "2.0",
        "id": "server-error",
        "error": {"code": -32000, "message": "database unavailable"}
    })]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.initialize().await.unwrap_err();
    assert!(err.to_string().contains("database unavailable"));
    assert!(!client.is_initialized().await);
}

#[tokio::test]
async fn unexpected_content_type_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let err = client_for(&server).initialize().await.unwrap_err();
    assert!(err.to_string().contains("Unexpected Content-Type"));
}

#[tokio::test]
async fn http_failure_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client_for(&server).initialize().await.unwrap_err();
    assert!(matches!(err, SupportChatError::Transport(_)));
}

#[tokio::test]
async fn concurrent_initialize_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(50))
                .set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": request_id(request),
                    "result": {"tools": [{"name": "get_order"}]}
                }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.initialize().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    client.initialize().await.unwrap();

    assert_eq!(client.list_tools().await.len(), 1);
}

#[tokio::test]
async fn call_tool_sends_name_and_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "tools/call",
            "params": {"name": "get_order", "arguments": {"order_id": "A-1"}}
        })))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": request_id(request),
                "result": {"status": "ok"}
            }))
        })
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .call_tool("get_order", json!({"order_id": "A-1"}))
        .await
        .unwrap();
    assert_eq!(result.render(), "{\n  \"status\": \"ok\"\n}");
}

#[tokio::test]
async fn closed_client_refuses_calls() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.close();

    assert!(client.initialize().await.is_err());
    assert!(client.call_tool("get_order", json!({})).await.is_err());
}
