pub mod auth;
pub mod proxy;
pub mod ws;

use axum::routing::{any, get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/me", get(auth::me))
        // Backend services
        .route("/api/{service}/{*path}", any(proxy::forward))
        // Live notifications and chat
        .route("/ws", get(ws::upgrade))
}
