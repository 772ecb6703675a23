// tests for the ai client against a local stand-in endpoint

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::json;

use cliniq::{Claude, Error};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> Claude {
    Claude::new(Some("test-key".into()))
        .unwrap()
        .with_base_url(base_url)
}

#[tokio::test]
async fn text_reply_is_returned() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async {
            Json(json!({
                "content": [{"type": "text", "text": "The agenda is empty."}],
                "stop_reason": "end_turn"
            }))
        }),
    );

    let claude = client(spawn(app).await);
    let reply = claude.complete("anything today?", "system", &[]).await.unwrap();

    assert_eq!(reply.text, "The agenda is empty.");
    assert!(reply.tool_call.is_none());
}

#[tokio::test]
async fn tool_use_reply_is_parsed() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async {
            Json(json!({
                "content": [
                    {"type": "text", "text": "Looking that up."},
                    {"type": "tool_use", "id": "tu_1", "name": "list_tables", "input": {}}
                ],
                "stop_reason": "tool_use"
            }))
        }),
    );

    let claude = client(spawn(app).await);
    let reply = claude
        .complete("what tables exist?", "system", &[json!({"name": "list_tables"})])
        .await
        .unwrap();

    assert_eq!(reply.text, "Looking that up.");
    assert_eq!(reply.tool_call.unwrap().name, "list_tables");
}

#[tokio::test]
async fn non_2xx_surfaces_as_service_error() {
    let app = Router::new().route(
        "/v1/messages",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "overloaded") }),
    );

    let claude = client(spawn(app).await);
    let err = claude.complete("hi", "system", &[]).await.unwrap_err();

    match err {
        Error::Service(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected Service, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_surfaces_as_service_error() {
    // bind then drop so the port is known-dead
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let claude = client(format!("http://{addr}"));
    let err = claude.complete("hi", "system", &[]).await.unwrap_err();

    assert!(matches!(err, Error::Service(_)));
}

#[tokio::test]
async fn garbage_body_surfaces_as_service_error() {
    let app = Router::new().route("/v1/messages", post(|| async { "not json" }));

    let claude = client(spawn(app).await);
    let err = claude.complete("hi", "system", &[]).await.unwrap_err();

    assert!(matches!(err, Error::Service(_)));
}
