use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::realtime::{self, InboundMessage, ViewerGuard};
use crate::state::SharedState;

/// Events pushed to the browser.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    Status {
        connected: bool,
    },
    Notification {
        payload: Value,
    },
    Chat {
        #[serde(rename = "roomId")]
        room_id: Uuid,
        payload: Value,
    },
    Error {
        message: String,
    },
}

/// Commands the browser sends.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    JoinChat {
        #[serde(rename = "roomId")]
        room_id: Uuid,
    },
    LeaveChat {
        #[serde(rename = "roomId")]
        room_id: Uuid,
    },
    ChatMessage {
        #[serde(rename = "roomId")]
        room_id: Uuid,
        content: String,
    },
}

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Response {
    let Some(tokens) = auth.session.tokens() else {
        return AppError::Unauthorized("Missing authentication token".to_string()).into_response();
    };

    ws.on_upgrade(move |socket| relay(socket, state, auth.user, tokens.access_token))
}

type Sink = SplitSink<WebSocket, Message>;

async fn push(sink: &mut Sink, event: &ServerEvent) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_default();
    sink.send(Message::Text(text.into())).await
}

async fn relay(socket: WebSocket, state: SharedState, user: CurrentUser, access_token: String) {
    let mut viewer = state.hub.attach(user.id, &access_token);
    let mut inbound = viewer.handle().messages();
    let mut connected = viewer.handle().connected();
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(username = %user.username, "Browser attached to realtime channel");

    let initial = *connected.borrow_and_update();
    if push(&mut sink, &ServerEvent::Status { connected: initial }).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = connected.changed() => {
                if changed.is_err() {
                    // Channel shut down (logout).
                    let _ = push(&mut sink, &ServerEvent::Status { connected: false }).await;
                    break;
                }
                let now = *connected.borrow_and_update();
                if push(&mut sink, &ServerEvent::Status { connected: now }).await.is_err() {
                    break;
                }
            }
            message = inbound.recv() => match message {
                Ok(message) => {
                    if let Some(event) = classify(&viewer, message) {
                        if push(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(username = %user.username, "Browser relay lagged, skipped {skipped} messages");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = handle_command(&mut viewer, &user, text.as_str()) {
                        if push(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Browser socket error: {e}");
                    break;
                }
            },
        }
    }

    tracing::debug!(username = %user.username, "Browser detached from realtime channel");
}

fn payload_of(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// Route an inbound STOMP message to this browser, if it is one it listens to.
fn classify(viewer: &ViewerGuard, message: InboundMessage) -> Option<ServerEvent> {
    if message.destination == viewer.notification_topic() {
        return Some(ServerEvent::Notification {
            payload: payload_of(message.body),
        });
    }

    let room_id = realtime::chat_room_of(&message.destination)?;
    viewer.in_chat(room_id).then(|| ServerEvent::Chat {
        room_id,
        payload: payload_of(message.body),
    })
}

fn handle_command(viewer: &mut ViewerGuard, user: &CurrentUser, text: &str) -> Option<ServerEvent> {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            return Some(ServerEvent::Error {
                message: format!("Invalid command: {e}"),
            });
        }
    };

    match command {
        ClientCommand::JoinChat { room_id } => viewer.join_chat(room_id),
        ClientCommand::LeaveChat { room_id } => viewer.leave_chat(room_id),
        ClientCommand::ChatMessage { room_id, content } => {
            let content = content.trim();
            if content.is_empty() {
                return Some(ServerEvent::Error {
                    message: "Message cannot be empty".to_string(),
                });
            }
            if !viewer.handle().is_connected() {
                tracing::warn!(username = %user.username, "Chat message dropped while disconnected");
                return Some(ServerEvent::Error {
                    message: "Chat is offline; message not sent".to_string(),
                });
            }
            let body = json!({
                "roomId": room_id,
                "senderId": user.id,
                "senderName": user.display_name,
                "content": content,
            });
            viewer.send_chat(room_id, &body.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_wire_format() {
        let room = Uuid::nil();
        let chat = serde_json::to_value(ServerEvent::Chat {
            room_id: room,
            payload: json!({"content": "hi"}),
        })
        .unwrap();
        assert_eq!(chat["type"], "chat");
        assert_eq!(chat["roomId"], room.to_string());

        let status = serde_json::to_value(ServerEvent::Status { connected: true }).unwrap();
        assert_eq!(status, json!({"type": "status", "connected": true}));
    }

    #[test]
    fn parses_browser_commands() {
        let room = Uuid::now_v7();
        let cmd: ClientCommand =
            serde_json::from_str(&format!(r#"{{"type":"chatMessage","roomId":"{room}","content":"yo"}}"#))
                .unwrap();
        assert!(matches!(cmd, ClientCommand::ChatMessage { room_id, .. } if room_id == room));
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"nope"}"#).is_err());
    }

    #[test]
    fn non_json_bodies_pass_through_as_strings() {
        assert_eq!(payload_of("plain".to_string()), Value::String("plain".to_string()));
        assert_eq!(payload_of("{\"a\":1}".to_string()), json!({"a": 1}));
    }
}
