use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::auth::extractor::AuthContext;
use crate::auth::session;
use crate::client::{ApiError, Session, SessionChange};
use crate::models::CurrentUser;
use crate::services::identity;
use crate::state::SharedState;

/// Resolve the session and current user for every request.
///
/// The user comes from the `hb_user` cookie when it is still bound to this
/// session, otherwise from `checkUser`. Token refreshes or a cleared session
/// that happen while the request is served are written back as cookies.
pub async fn load_user(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = Arc::new(session::from_jar(&jar, &state.config));
    let mut user = None;
    let mut fresh_user = false;
    let mut unavailable = None;

    if session.is_authenticated() {
        user = session::cached_user(&jar, &state.config, &session);
        if user.is_none() {
            match identity::my_info(&state.api, &session).await {
                Ok(profile) => {
                    user = Some(CurrentUser::from(&profile));
                    fresh_user = true;
                }
                Err(ApiError::Unauthorized(msg)) => {
                    tracing::debug!("Session rejected by identity service: {msg}");
                }
                Err(ApiError::Network(msg)) => unavailable = Some(msg),
                Err(e) => tracing::warn!("checkUser failed: {e}"),
            }
        }
    }

    req.extensions_mut().insert(AuthContext {
        session: session.clone(),
        user: user.clone(),
        unavailable,
    });

    let response = next.run(req).await;
    persist(&state, jar, &session, user.as_ref(), fresh_user, response)
}

fn persist(
    state: &SharedState,
    jar: CookieJar,
    session: &Session,
    user: Option<&CurrentUser>,
    fresh_user: bool,
    response: Response,
) -> Response {
    if sets_session_cookie(&response) {
        // The handler established or ended the session itself (login, logout).
        return response;
    }

    let config = &state.config;
    let Some(id) = session.id() else {
        return response;
    };
    let jar = match session.change() {
        SessionChange::Cleared => session::clear_auth_cookies(jar),
        SessionChange::Updated(tokens) => {
            let cookies = session::session_cookie(id, &tokens, config).and_then(|cookie| {
                let jar = jar.add(cookie);
                match user {
                    Some(user) => Ok(jar.add(session::user_cookie(user, id, config)?)),
                    None => Ok(jar),
                }
            });
            match cookies {
                Ok(jar) => jar,
                Err(e) => {
                    tracing::error!("Failed to write refreshed session: {e}");
                    return response;
                }
            }
        }
        SessionChange::Unchanged => {
            let (Some(user), true) = (user, fresh_user) else {
                return response;
            };
            match session::user_cookie(user, id, config) {
                Ok(cookie) => jar.add(cookie),
                Err(e) => {
                    tracing::error!("Failed to cache current user: {e}");
                    return response;
                }
            }
        }
    };

    (jar, response).into_response()
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", session::SESSION_COOKIE);
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
