use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::toast;
use super::Nav;
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::timestamp;
use crate::services::chat;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate {
    nav: Nav,
    room_id: String,
    room_name: String,
    messages: Vec<MessageRow>,
}

struct MessageRow {
    sender: String,
    content: String,
    mine: bool,
    created_at: String,
}

/// Room history; new messages arrive over `/ws` once the page joins the room.
pub async fn room(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (room, history) = tokio::try_join!(
        chat::get_room(&state.api, auth.session(), room_id),
        chat::messages(&state.api, auth.session(), room_id),
    )?;

    let messages = history
        .iter()
        .map(|m| MessageRow {
            sender: m
                .sender_name
                .clone()
                .unwrap_or_else(|| m.sender_id.to_string()),
            content: m.content.clone(),
            mine: m.sender_id == auth.user.id,
            created_at: timestamp::display(&m.created_at),
        })
        .collect();

    let (jar, toast) = toast::take(jar);
    let template = ChatTemplate {
        nav: Nav::for_user(&auth.user, toast),
        room_id: room.id.to_string(),
        room_name: room.name.clone(),
        messages,
    };
    Ok((jar, Html(template.render().unwrap_or_default())))
}
