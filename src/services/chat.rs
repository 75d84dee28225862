use uuid::Uuid;

use super::COMMUNICATION;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::{ChatMessage, ChatRoom};

pub async fn my_rooms(api: &ApiClient, session: &Session) -> Result<Vec<ChatRoom>, ApiError> {
    api.list(session, &format!("{COMMUNICATION}/chat-rooms"), &[])
        .await
}

pub async fn get_room(api: &ApiClient, session: &Session, id: Uuid) -> Result<ChatRoom, ApiError> {
    api.get(session, &format!("{COMMUNICATION}/chat-rooms/{id}"))
        .await
}

/// Room history, oldest first.
pub async fn messages(
    api: &ApiClient,
    session: &Session,
    room_id: Uuid,
) -> Result<Vec<ChatMessage>, ApiError> {
    let mut items: Vec<ChatMessage> = api
        .list(
            session,
            &format!("{COMMUNICATION}/chat-rooms/{room_id}/messages"),
            &[],
        )
        .await?;
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(items)
}
