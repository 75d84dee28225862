pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod client;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod views;
pub mod realtime;
pub mod crypto;
pub mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth_context::load_user;
use crate::middleware::auth_redirect::redirect_unauthorized;
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config) -> Result<Router, String> {
    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState::new(config)?);
    spawn_limiter_cleanup(&state);

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(views::view_routes().layer(from_fn(redirect_unauthorized)))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        .layer(from_fn_with_state(state.clone(), load_user))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_size)),
        )
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state);

    Ok(app)
}

/// Prune expired login-failure windows until the app is dropped.
fn spawn_limiter_cleanup(state: &SharedState) {
    let state = Arc::downgrade(state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(state) = state.upgrade() else { break };
            state.login_limiter.cleanup();
        }
    });
}

async fn health() -> &'static str {
    "ok"
}
