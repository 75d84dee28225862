use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::client::Session;
use crate::error::AppError;
use crate::models::CurrentUser;

/// What `load_user` resolved for this request: the backend session and,
/// once `checkUser` succeeded, the user.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: Arc<Session>,
    pub user: Option<CurrentUser>,
    /// Set when `checkUser` could not reach the identity service.
    pub unavailable: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            session: Arc::new(Session::anonymous()),
            user: None,
            unavailable: None,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_else(AuthContext::anonymous))
    }
}

/// An authenticated user. Rejects with 401 when `checkUser` did not resolve one.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: CurrentUser,
    pub session: Arc<Session>,
}

impl AuthUser {
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state).await?;
        match (ctx.user, ctx.unavailable) {
            (Some(user), _) => Ok(AuthUser {
                user,
                session: ctx.session,
            }),
            (None, Some(reason)) => Err(AppError::Unavailable(reason)),
            (None, None) => Err(AppError::Unauthorized(
                "Missing authentication token".to_string(),
            )),
        }
    }
}
