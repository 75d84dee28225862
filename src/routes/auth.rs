use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{AuthContext, AuthUser};
use crate::auth::session;
use crate::client::{ApiError, Session};
use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::identity;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Credentials the identity service turned down, as opposed to it being unreachable.
fn is_rejection(err: &ApiError) -> bool {
    match err {
        ApiError::Unauthorized(_) => true,
        ApiError::Status { status, .. } => {
            *status == StatusCode::BAD_REQUEST || *status == StatusCode::FORBIDDEN
        }
        _ => false,
    }
}

/// Log in against the identity service and issue the session cookies.
/// Shared by the JSON endpoint and the login form.
pub async fn establish_session(
    state: &SharedState,
    jar: CookieJar,
    username: &str,
    password: &str,
) -> Result<(CookieJar, CurrentUser), AppError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    if state.login_limiter.check(username).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let tokens = match identity::login(&state.api, username, password).await {
        Ok(tokens) => tokens,
        Err(err) if is_rejection(&err) => {
            state.login_limiter.record_failure(username);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let backend_session = Session::establish(tokens);
    let profile = identity::my_info(&state.api, &backend_session).await?;
    let user = CurrentUser::from(&profile);

    state.login_limiter.reset(username);
    let jar = session::auth_cookies(jar, &backend_session, &user, &state.config)
        .map_err(AppError::Internal)?;

    tracing::info!(username = %user.username, roles = ?user.roles, "User logged in");
    Ok((jar, user))
}

/// End the backend session and drop the user's live channel.
pub async fn end_session(state: &SharedState, ctx: &AuthContext, jar: CookieJar) -> CookieJar {
    identity::logout(&state.api, &ctx.session).await;
    if let Some(user) = &ctx.user {
        state.hub.disconnect(user.id);
        tracing::info!(username = %user.username, "User logged out");
    }
    ctx.session.clear();
    session::clear_auth_cookies(jar)
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<CurrentUser>), AppError> {
    let (jar, user) = establish_session(&state, jar, &req.username, &req.password).await?;
    Ok((jar, Json(user)))
}

pub async fn logout(
    State(state): State<SharedState>,
    ctx: AuthContext,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = end_session(&state, &ctx, jar).await;
    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// Force a token refresh; the auth middleware writes the new cookies.
pub async fn refresh(
    State(state): State<SharedState>,
    ctx: AuthContext,
) -> Result<Json<MessageResponse>, AppError> {
    let tokens = ctx
        .session
        .tokens()
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    match state.api.tokens().refresh(&tokens).await {
        Ok(fresh) => {
            ctx.session.replace(fresh);
            Ok(Json(MessageResponse {
                message: "Session refreshed".to_string(),
            }))
        }
        Err(ApiError::Network(msg)) => Err(AppError::Unavailable(msg)),
        Err(err) => {
            ctx.session.clear();
            Err(AppError::Unauthorized(err.user_message()))
        }
    }
}

/// The `checkUser` result for this session.
pub async fn me(auth: AuthUser) -> Json<CurrentUser> {
    Json(auth.user)
}
