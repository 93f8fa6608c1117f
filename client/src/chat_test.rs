use axum::Router;
use axum::extract::ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tokio::time::{Duration, timeout};

use super::*;

/// Greets with two frames, then echoes text until it receives `bye`.
async fn echo(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(run_echo)
}

async fn run_echo(mut socket: WebSocket) {
    for greeting in ["first", "second"] {
        if socket.send(AxumMessage::Text(greeting.into())).await.is_err() {
            return;
        }
    }
    while let Some(Ok(message)) = socket.recv().await {
        let AxumMessage::Text(text) = message else { continue };
        if text.as_str() == "bye" {
            let _ = socket.send(AxumMessage::Close(None)).await;
            return;
        }
        if socket.send(AxumMessage::Text(text)).await.is_err() {
            return;
        }
    }
}

async fn serve() -> ClientConfig {
    let app = Router::new().route("/api/ws/{pid}", get(echo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ClientConfig::new(format!("http://{addr}"))
}

#[tokio::test]
async fn pump_appends_frames_in_arrival_order() {
    let config = serve().await;
    let (sender, mut receiver) = ChatClient::new(config).join(1).await.unwrap();

    sender.send("hello");
    sender.send("hello");
    sender.send("<b>raw</b>");
    sender.send("bye");

    let mut log: Vec<String> = Vec::new();
    let appended = timeout(Duration::from_secs(5), receiver.pump(&mut log))
        .await
        .expect("pump should finish when the server closes");

    assert_eq!(appended, 5);
    assert_eq!(log, vec!["first", "second", "hello", "hello", "<b>raw</b>"]);
}

#[tokio::test]
async fn send_after_close_is_dropped_silently() {
    let config = serve().await;
    let (sender, mut receiver) = ChatClient::new(config).join(3).await.unwrap();

    sender.send("bye");
    let mut log: Vec<String> = Vec::new();
    timeout(Duration::from_secs(5), receiver.pump(&mut log))
        .await
        .expect("pump should finish when the server closes");

    sender.send("anyone there?");
    assert_eq!(log, vec!["first", "second"]);
}

#[tokio::test]
async fn connect_to_dead_server_fails() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = connect(&format!("ws://{addr}/api/ws/1")).await;
    assert!(matches!(result, Err(ChatError::Connect(_))));
}

#[tokio::test]
async fn join_rejects_non_http_base_url() {
    let client = ChatClient::new(ClientConfig::new("ftp://nowhere"));
    let result = client.join(1).await;
    assert!(matches!(result, Err(ChatError::Config(ConfigError::InvalidBaseUrl(_)))));
}
