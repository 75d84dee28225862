//! HTTP client for the backend services.
//!
//! Every call carries the session's bearer token. A 401 triggers one
//! single-flight refresh through [`TokenService`] and exactly one retry;
//! if that fails too, the session is cleared and the caller gets
//! [`ApiError::Unauthorized`]. Calls made with a cancel key supersede any
//! earlier call under the same key for the same session; anonymous calls
//! are never keyed.

pub mod cancel;
pub mod envelope;
pub mod error;
pub mod session;
pub mod token;

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

pub use cancel::RequestRegistry;
pub use envelope::{Listing, Page};
pub use error::ApiError;
pub use session::{Session, SessionChange, TokenPair};
pub use token::TokenService;

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Endpoint key; a newer request with the same key cancels this one.
    pub cancel_key: Option<String>,
    /// Skip bearer injection and refresh handling (login, public endpoints).
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            cancel_key: Some(key.into()),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            cancel_key: None,
            anonymous: true,
        }
    }
}

/// A request passed through verbatim (the `/api/{service}/...` proxy).
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenService,
    requests: RequestRegistry,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            tokens: TokenService::new(http.clone(), &base_url),
            http,
            base_url,
            requests: RequestRegistry::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    pub async fn get<T: DeserializeOwned>(&self, session: &Session, path: &str) -> Result<T, ApiError> {
        self.send(session, Method::GET, path, None::<&()>, &RequestOptions::default())
            .await
    }

    /// GET a listing, accepting either a bare array or a page.
    pub async fn list<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let path = with_query(path, query);
        let listing: Listing<T> = self.get(session, &path).await?;
        Ok(listing.into_items())
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(session, Method::POST, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(session, Method::PUT, path, Some(body), &RequestOptions::default())
            .await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .send(session, Method::DELETE, path, None::<&()>, &RequestOptions::default())
            .await?;
        Ok(())
    }

    pub async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("Failed to encode request body: {e}")))?
            .map(Bytes::from);
        let url = self.url(path);

        let response = self
            .execute(session, options, || {
                let req = self.http.request(method.clone(), &url);
                match &payload {
                    Some(bytes) => req
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(bytes.clone()),
                    None => req,
                }
            })
            .await?;

        envelope::decode(response).await
    }

    /// Forward a raw request. Non-2xx responses are returned as-is, except a
    /// 401 that survives the refresh retry.
    pub async fn forward(
        &self,
        session: &Session,
        request: ForwardRequest,
        options: &RequestOptions,
    ) -> Result<Response, ApiError> {
        let url = self.url(&request.path_and_query);
        self.execute(session, options, || {
            self.http
                .request(request.method.clone(), &url)
                .headers(request.headers.clone())
                .body(request.body.clone())
        })
        .await
    }

    async fn execute<F>(
        &self,
        session: &Session,
        options: &RequestOptions,
        build: F,
    ) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let attempt = self.attempt_with_refresh(session, options, &build);

        match (&options.cancel_key, session.id()) {
            (Some(key), Some(id)) => {
                let inflight = self.requests.begin(&format!("{id}:{key}"));
                inflight.run(attempt).await?
            }
            (Some(key), None) => {
                // Without a session there is nothing to scope the key to.
                tracing::debug!("Ignoring request key {key} for anonymous request");
                attempt.await
            }
            (None, _) => attempt.await,
        }
    }

    async fn attempt_with_refresh<F>(
        &self,
        session: &Session,
        options: &RequestOptions,
        build: &F,
    ) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let used = if options.anonymous {
            None
        } else {
            session.tokens()
        };

        let response = dispatch(build, used.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Nothing to refresh with; let the caller see the 401.
        let Some(stale) = used else {
            return Ok(response);
        };
        drop(response);

        let fresh = match self.tokens.refresh(&stale).await {
            Ok(pair) => pair,
            Err(ApiError::Network(msg)) => return Err(ApiError::Network(msg)),
            Err(err) => {
                session.clear();
                return Err(ApiError::Unauthorized(err.user_message()));
            }
        };
        session.replace(fresh.clone());

        let retried = dispatch(build, Some(&fresh)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Request still unauthorized after token refresh; clearing session");
            session.clear();
            let status = retried.status();
            let body = retried.bytes().await.unwrap_or_default();
            return Err(ApiError::Unauthorized(envelope::error_message(status, &body)));
        }

        Ok(retried)
    }
}

async fn dispatch<F>(build: &F, tokens: Option<&TokenPair>) -> Result<Response, ApiError>
where
    F: Fn() -> RequestBuilder,
{
    let mut req = build();
    if let Some(tokens) = tokens {
        req = req.bearer_auth(&tokens.access_token);
    }

    req.send().await.map_err(|e| {
        tracing::warn!("Backend request failed: {e}");
        ApiError::from(e)
    })
}

/// Append `query` to `path` as an urlencoded query string.
pub fn with_query(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }

    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();

    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{encoded}")
}
