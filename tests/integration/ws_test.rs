//! Integration tests for the WebSocket gateway over a real listener.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(app: &helpers::TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn open(addr: SocketAddr, token: &str) -> WsStream {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token={token}"))
        .await
        .expect("Failed to connect");
    ws
}

/// Next JSON text frame, or `None` once the server closed the socket.
async fn next_event(ws: &mut WsStream) -> Option<Value> {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for a frame");
        match next {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn test_ready_is_the_first_frame() {
    let app = helpers::TestApp::new().await;
    let addr = serve(&app).await;
    let alice = app.register("alice").await;

    let mut ws = open(addr, &alice.token).await;
    let ready = next_event(&mut ws).await.unwrap();

    assert_eq!(ready["event"], "Ready");
    assert_eq!(ready["data"]["id"], alice.user_id.as_str());
    assert_eq!(ready["data"]["username"], "alice");
    assert!(ready["data"]["relatedUsers"].as_array().unwrap().is_empty());

    // Presence is recorded right after Ready goes out.
    let mut online = 0;
    for _ in 0..50 {
        let health = app.request("GET", "/api/health", None, None).await;
        assert_eq!(health.status, StatusCode::OK);
        online = health.body["online_users"].as_u64().unwrap();
        if online == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(online, 1);
}

#[tokio::test]
async fn test_bad_token_gets_exception_then_close() {
    let app = helpers::TestApp::new().await;
    let addr = serve(&app).await;

    let mut ws = open(addr, "garbage").await;
    let exception = next_event(&mut ws).await.unwrap();

    assert_eq!(exception["event"], "exception");
    assert_eq!(exception["data"]["type"], "onGatewayConnection");
    assert_eq!(exception["data"]["message"], "Invalid session.");
    assert!(next_event(&mut ws).await.is_none());
}

#[tokio::test]
async fn test_friend_sees_presence_and_messages() {
    let app = helpers::TestApp::new().await;
    let addr = serve(&app).await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let chat_id = app.befriend(&alice, &bob).await;

    let mut bob_ws = open(addr, &bob.token).await;
    let ready = next_event(&mut bob_ws).await.unwrap();
    assert_eq!(ready["event"], "Ready");
    assert_eq!(ready["data"]["relatedUsers"][0]["online"], false);

    let mut alice_ws = open(addr, &alice.token).await;
    assert_eq!(next_event(&mut alice_ws).await.unwrap()["event"], "Ready");

    let online = next_event(&mut bob_ws).await.unwrap();
    assert_eq!(online["event"], "User:Update");
    assert_eq!(online["data"]["user"]["id"], alice.user_id.as_str());
    assert_eq!(online["data"]["user"]["online"], true);

    let sent = app
        .request(
            "POST",
            &format!("/api/chats/{chat_id}/messages"),
            Some(serde_json::json!({ "content": "hey bob", "ackId": "c-7" })),
            Some(&alice.token),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);

    let message = next_event(&mut bob_ws).await.unwrap();
    assert_eq!(message["event"], "Message:New");
    assert_eq!(message["data"]["content"], "hey bob");
    assert_eq!(message["data"]["ackId"], "c-7");
}

#[tokio::test]
async fn test_logout_closes_session_sockets() {
    let app = helpers::TestApp::new().await;
    let addr = serve(&app).await;
    let alice = app.register("alice").await;

    let mut ws = open(addr, &alice.token).await;
    assert_eq!(next_event(&mut ws).await.unwrap()["event"], "Ready");

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&alice.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert!(next_event(&mut ws).await.is_none());
}
