use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::timestamp;
use crate::services::{chat, notifications};
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "notifications.html")]
struct NotificationsTemplate {
    nav: Nav,
    unread: u64,
    notifications: Vec<NotificationRow>,
    rooms: Vec<RoomRow>,
}

struct NotificationRow {
    id: String,
    title: String,
    content: String,
    kind: String,
    read: bool,
    created_at: String,
}

struct RoomRow {
    id: String,
    name: String,
}

pub async fn index(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let session = auth.session();
    let (items, unread, rooms) = tokio::try_join!(
        notifications::list(&state.api, session),
        notifications::unread_count(&state.api, session),
        chat::my_rooms(&state.api, session),
    )?;

    let (jar, toast) = toast::take(jar);
    let template = NotificationsTemplate {
        nav: Nav::for_user(&auth.user, toast),
        unread,
        notifications: items
            .iter()
            .map(|n| NotificationRow {
                id: n.id.to_string(),
                title: n.title.clone(),
                content: n.content.clone(),
                kind: n.notification_type.clone().unwrap_or_default(),
                read: n.read,
                created_at: timestamp::display(&n.created_at),
            })
            .collect(),
        rooms: rooms
            .iter()
            .map(|r| RoomRow {
                id: r.id.to_string(),
                name: r.name.clone(),
            })
            .collect(),
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}

pub async fn mark_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = notifications::mark_read(&state.api, auth.session(), id)
        .await
        .map_err(AppError::from);
    toast::after_submit(jar, outcome, "/notifications", "Notification marked as read")
}

pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let outcome = notifications::mark_all_read(&state.api, auth.session())
        .await
        .map_err(AppError::from);
    toast::after_submit(jar, outcome, "/notifications", "All notifications marked as read")
}
