use serde::Deserialize;
use uuid::Uuid;

use super::COMMUNICATION;
use crate::client::{ApiClient, ApiError, Session};
use crate::models::Notification;

#[derive(Deserialize)]
#[serde(untagged)]
enum UnreadCount {
    Bare(u64),
    Wrapped { count: u64 },
}

/// Notifications for the session's user, newest first.
pub async fn list(api: &ApiClient, session: &Session) -> Result<Vec<Notification>, ApiError> {
    let mut items: Vec<Notification> = api
        .list(session, &format!("{COMMUNICATION}/notifications"), &[])
        .await?;
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(items)
}

pub async fn unread_count(api: &ApiClient, session: &Session) -> Result<u64, ApiError> {
    let count: UnreadCount = api
        .get(session, &format!("{COMMUNICATION}/notifications/unread-count"))
        .await?;
    Ok(match count {
        UnreadCount::Bare(n) => n,
        UnreadCount::Wrapped { count } => count,
    })
}

pub async fn mark_read(api: &ApiClient, session: &Session, id: Uuid) -> Result<(), ApiError> {
    let _: serde::de::IgnoredAny = api
        .put(
            session,
            &format!("{COMMUNICATION}/notifications/{id}/read"),
            &serde_json::Value::Null,
        )
        .await?;
    Ok(())
}

pub async fn mark_all_read(api: &ApiClient, session: &Session) -> Result<(), ApiError> {
    let _: serde::de::IgnoredAny = api
        .put(
            session,
            &format!("{COMMUNICATION}/notifications/read-all"),
            &serde_json::Value::Null,
        )
        .await?;
    Ok(())
}
