use axum::body::{Body, Bytes};
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::extractor::AuthContext;
use crate::client::{ApiError, ForwardRequest, RequestOptions};
use crate::error::AppError;
use crate::services::PROXIED_SERVICES;
use crate::state::SharedState;

pub const REQUEST_KEY: HeaderName = HeaderName::from_static("x-request-key");
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// `ANY /api/{service}/{*path}`: pass the call through to the backend with the
/// session's bearer token. Status and body come back untouched.
pub async fn forward(
    State(state): State<SharedState>,
    ctx: AuthContext,
    Path((service, path)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if !PROXIED_SERVICES.contains(&service.as_str()) {
        return Err(AppError::NotFound(format!("Unknown service: {service}")));
    }

    let mut path_and_query = format!("/{service}/{path}");
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        path_and_query.push('?');
        path_and_query.push_str(&query);
    }

    let mut forwarded = HeaderMap::new();
    for name in [CONTENT_TYPE, ACCEPT, REQUEST_KEY] {
        if let Some(value) = headers.get(&name) {
            forwarded.insert(name, value.clone());
        }
    }
    let request_id = Uuid::now_v7().to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        forwarded.insert(REQUEST_ID, value);
    }

    let options = match headers.get(&REQUEST_KEY).and_then(|v| v.to_str().ok()) {
        Some(key) => RequestOptions::keyed(key),
        None => RequestOptions::default(),
    };

    tracing::debug!(%request_id, %method, path = %path_and_query, "Proxying request");

    let upstream = state
        .api
        .forward(
            &ctx.session,
            ForwardRequest {
                method,
                path_and_query,
                headers: forwarded,
                body,
            },
            &options,
        )
        .await?;

    relay(upstream).await
}

async fn relay(upstream: reqwest::Response) -> Result<Response, AppError> {
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let body = upstream.bytes().await.map_err(ApiError::from)?;

    let mut response = Response::builder().status(status);
    if let Some(content_type) = content_type {
        response = response.header(CONTENT_TYPE, content_type);
    }
    response
        .body(Body::from(body))
        .map_err(|e| AppError::Internal(format!("Failed to build proxied response: {e}")))
}
