//! WebSocket layer — realtime chat events.
//!
//! Each connection gets its own conversation session, announced in the
//! Welcome message. Incoming and outgoing chat payloads carry the same
//! `{status, response?, error?}` shape as the REST endpoint so clients
//! share one decoder. Heartbeat every 30s; 3 missed = disconnect.
//! Malformed incoming JSON is ignored, the connection stays up.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::api::types::ApiContext;
use crate::assistant::Assistant;

/// Heartbeat interval: server sends Heartbeat every 30 seconds.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Disconnect after this many heartbeats without a Pong.
const MAX_MISSED_HEARTBEATS: u32 = 3;

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsIncoming {
    /// One chat message for this connection's session.
    ChatMessage { message: String },
    /// Drop this connection's conversation history.
    ClearHistory {},
    /// Heartbeat response.
    Pong {},
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsOutgoing {
    /// Connection acknowledged; the session id for this conversation.
    Welcome { session_id: String },
    /// Reply to a ChatMessage — same shape as the REST chat payload.
    ChatResponse {
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        original_message: String,
    },
    /// History dropped after a ClearHistory request.
    HistoryCleared {},
    /// Server heartbeat (client should respond with Pong).
    Heartbeat { server_time: String },
}

/// WebSocket upgrade handler for `GET /ws/connect`.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(ctx): State<ApiContext>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, ctx.assistant))
}

/// Main connection handler: sender task for channel→WS forwarding, then
/// a receive + heartbeat loop until disconnect.
async fn handle_ws(socket: WebSocket, assistant: Arc<Assistant>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(%session_id, "WebSocket connected");

    let (ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<WsOutgoing>(64);

    // Sender task: reads from the channel, writes JSON to the socket.
    let sender_handle = tokio::spawn(async move {
        let mut sink = ws_sink;
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(j) => j,
                Err(_) => continue,
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let _ = tx
        .send(WsOutgoing::Welcome {
            session_id: session_id.clone(),
        })
        .await;

    let mut missed_heartbeats: u32 = 0;
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // Consume initial immediate tick

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(ref text))) => {
                        // Malformed JSON is silently ignored.
                        if let Ok(incoming) = serde_json::from_str::<WsIncoming>(text) {
                            match incoming {
                                WsIncoming::Pong {} => missed_heartbeats = 0,
                                WsIncoming::ClearHistory {} => {
                                    assistant.clear_history(Some(&session_id));
                                    let _ = tx.send(WsOutgoing::HistoryCleared {}).await;
                                }
                                WsIncoming::ChatMessage { message } => {
                                    dispatch_chat(&assistant, &session_id, message, &tx);
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Ping/Pong frames handled by axum/tungstenite
                }
            }
            _ = heartbeat.tick() => {
                if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                    tracing::info!(
                        %session_id,
                        "{MAX_MISSED_HEARTBEATS} missed heartbeats, disconnecting"
                    );
                    break;
                }
                missed_heartbeats += 1;
                let _ = tx.send(WsOutgoing::Heartbeat {
                    server_time: chrono::Utc::now().to_rfc3339(),
                }).await;
            }
        }
    }

    // Cleanup: drop sender (stops sender task), drop the per-connection
    // session so dead conversations don't pile up in the store.
    drop(tx);
    let _ = sender_handle.await;
    assistant.clear_history(Some(&session_id));
    tracing::info!(%session_id, "WebSocket disconnected");
}

/// Process one chat message on its own task so heartbeats keep flowing
/// while the upstream call is in flight.
fn dispatch_chat(
    assistant: &Arc<Assistant>,
    session_id: &str,
    message: String,
    tx: &mpsc::Sender<WsOutgoing>,
) {
    let trimmed = message.trim().to_string();
    if trimmed.is_empty() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx
                .send(WsOutgoing::ChatResponse {
                    status: "error".into(),
                    response: None,
                    error: Some("Message cannot be empty".into()),
                    original_message: message,
                })
                .await;
        });
        return;
    }

    let assistant = assistant.clone();
    let session_id = session_id.to_string();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outgoing = match assistant.process_message(&session_id, &trimmed).await {
            Ok(reply) => WsOutgoing::ChatResponse {
                status: "success".into(),
                response: Some(reply),
                error: None,
                original_message: message,
            },
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "WS chat message failed");
                WsOutgoing::ChatResponse {
                    status: "error".into(),
                    response: None,
                    error: Some(err.user_message()),
                    original_message: message,
                }
            }
        };
        let _ = tx.send(outgoing).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router::api_router;
    use crate::config::AppConfig;
    use crate::directory::{DirectoryError, MockDirectory};
    use serde_json::json;
    use tokio_tungstenite::tungstenite;

    // ── Message shape tests ──

    #[test]
    fn incoming_chat_message_parses() {
        let parsed: WsIncoming =
            serde_json::from_str(r#"{"type": "ChatMessage", "message": "hello"}"#).unwrap();
        assert_eq!(
            parsed,
            WsIncoming::ChatMessage {
                message: "hello".into()
            }
        );
    }

    #[test]
    fn outgoing_chat_response_skips_absent_fields() {
        let msg = WsOutgoing::ChatResponse {
            status: "success".into(),
            response: Some("hi".into()),
            error: None,
            original_message: "hello".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ChatResponse");
        assert_eq!(json["status"], "success");
        assert_eq!(json["response"], "hi");
        assert!(json.get("error").is_none());
    }

    // ── Integration tests — full connection lifecycle ──

    /// Start a test server backed by a mock directory; returns the WS URL.
    async fn setup_ws_server(directory: MockDirectory) -> String {
        let assistant = Arc::new(Assistant::new(AppConfig::default(), Arc::new(directory)));
        let app = api_router(assistant);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("ws://{addr}/ws/connect")
    }

    type TestWs =
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    async fn next_json(ws: &mut TestWs) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for WS message")
            .expect("stream ended")
            .expect("WS error");
        serde_json::from_str(msg.to_text().expect("not text")).expect("not JSON")
    }

    #[tokio::test]
    async fn connect_receives_welcome_with_session_id() {
        let url = setup_ws_server(MockDirectory::returning(json!([]))).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("WS connect failed");

        let welcome = next_json(&mut ws).await;
        assert_eq!(welcome["type"], "Welcome");
        assert!(welcome["session_id"].is_string());

        let _ = ws.close(None).await;
    }

    #[tokio::test]
    async fn chat_round_trip_over_websocket() {
        let url = setup_ws_server(MockDirectory::returning(
            json!([{"id": "P1", "name": "John Smith"}]),
        ))
        .await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let _ = next_json(&mut ws).await; // Welcome

        let outgoing = json!({"type": "ChatMessage", "message": "show me all patients"});
        ws.send(tungstenite::Message::Text(outgoing.to_string()))
            .await
            .unwrap();

        let reply = next_json(&mut ws).await;
        assert_eq!(reply["type"], "ChatResponse");
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["original_message"], "show me all patients");
        assert!(reply["response"]
            .as_str()
            .unwrap()
            .contains("John Smith"));

        let _ = ws.close(None).await;
    }

    #[tokio::test]
    async fn upstream_failure_becomes_error_payload() {
        let url = setup_ws_server(MockDirectory::failing(DirectoryError::Status { code: 503 }))
            .await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let _ = next_json(&mut ws).await; // Welcome

        let outgoing = json!({"type": "ChatMessage", "message": "show me all patients"});
        ws.send(tungstenite::Message::Text(outgoing.to_string()))
            .await
            .unwrap();

        let reply = next_json(&mut ws).await;
        assert_eq!(reply["status"], "error");
        assert!(reply["error"].as_str().unwrap().contains("503"));

        let _ = ws.close(None).await;
    }

    #[tokio::test]
    async fn empty_message_is_rejected_in_payload() {
        let url = setup_ws_server(MockDirectory::returning(json!([]))).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let _ = next_json(&mut ws).await; // Welcome

        let outgoing = json!({"type": "ChatMessage", "message": "   "});
        ws.send(tungstenite::Message::Text(outgoing.to_string()))
            .await
            .unwrap();

        let reply = next_json(&mut ws).await;
        assert_eq!(reply["status"], "error");
        assert_eq!(reply["error"], "Message cannot be empty");

        let _ = ws.close(None).await;
    }

    #[tokio::test]
    async fn malformed_json_keeps_connection_alive() {
        let url = setup_ws_server(MockDirectory::returning(json!([]))).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let _ = next_json(&mut ws).await; // Welcome

        ws.send(tungstenite::Message::Text("not valid json {{{".into()))
            .await
            .unwrap();
        ws.send(tungstenite::Message::Text(r#"{"type": "NoSuchType"}"#.into()))
            .await
            .unwrap();

        // Connection must still process real messages.
        let outgoing = json!({"type": "ChatMessage", "message": "hello"});
        ws.send(tungstenite::Message::Text(outgoing.to_string()))
            .await
            .unwrap();

        let reply = next_json(&mut ws).await;
        assert_eq!(reply["type"], "ChatResponse");
        assert_eq!(reply["status"], "success");

        let _ = ws.close(None).await;
    }

    #[tokio::test]
    async fn clear_history_acknowledged() {
        let url = setup_ws_server(MockDirectory::returning(json!([]))).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let _ = next_json(&mut ws).await; // Welcome

        ws.send(tungstenite::Message::Text(
            json!({"type": "ChatMessage", "message": "hello"}).to_string(),
        ))
        .await
        .unwrap();
        let _ = next_json(&mut ws).await; // ChatResponse

        ws.send(tungstenite::Message::Text(
            json!({"type": "ClearHistory"}).to_string(),
        ))
        .await
        .unwrap();

        let reply = next_json(&mut ws).await;
        assert_eq!(reply["type"], "HistoryCleared");

        let _ = ws.close(None).await;
    }
}
