use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::extractor::AuthContext;
use crate::auth::roles::{self, Role};
use crate::error::AppError;

pub const LOGIN_PATH: &str = "/auth/login";
pub const FORBIDDEN_PATH: &str = "/forbidden";

const ANY_ROLE: &[Role] = &Role::ALL;

/// Allow-list for a group of pages.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    pub allowed: &'static [Role],
    pub redirect_to: &'static str,
}

impl RoleGuard {
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self {
            allowed,
            redirect_to: FORBIDDEN_PATH,
        }
    }

    pub const fn redirect_to(mut self, path: &'static str) -> Self {
        self.redirect_to = path;
        self
    }

    /// Any signed-in user.
    pub const fn authenticated() -> Self {
        Self::new(ANY_ROLE)
    }

    pub fn admits(&self, held: &[Role]) -> bool {
        roles::intersects(held, self.allowed)
    }
}

/// Runs the page handler only when the resolved user holds an allowed role.
pub async fn require_roles(State(guard): State<RoleGuard>, req: Request, next: Next) -> Response {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or_else(AuthContext::anonymous);

    match ctx.user {
        Some(user) if guard.admits(&user.roles) => next.run(req).await,
        Some(user) => {
            tracing::debug!(
                username = %user.username,
                path = %req.uri().path(),
                "Role guard denied access"
            );
            Redirect::to(guard.redirect_to).into_response()
        }
        None => match ctx.unavailable {
            Some(reason) => AppError::Unavailable(reason).into_response(),
            None => Redirect::to(LOGIN_PATH).into_response(),
        },
    }
}
