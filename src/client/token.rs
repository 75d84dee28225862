use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::envelope;
use super::error::ApiError;
use super::session::TokenPair;

pub const REFRESH_PATH: &str = "/identity-service/api/v1/auth/refresh";

/// How long a settled refresh is reused by requests that raced it.
const GRACE: Duration = Duration::from_secs(10);

pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
}

struct Settled {
    outcome: Result<TokenPair, ApiError>,
    at: Instant,
}

type Gate = Arc<Mutex<Option<Settled>>>;

/// Single-flight token refresh.
///
/// Every request that hits a 401 with the same refresh token waits on one gate;
/// the first one through performs the refresh and the rest reuse its outcome.
pub struct TokenService {
    http: reqwest::Client,
    refresh_url: String,
    gates: DashMap<String, Gate>,
}

impl TokenService {
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            refresh_url: format!("{api_url}{REFRESH_PATH}"),
            gates: DashMap::new(),
        }
    }

    /// The backend call runs on its own task that holds the gate, so the
    /// outcome is recorded even when the request that started it is cancelled.
    pub async fn refresh(&self, stale: &TokenPair) -> Result<TokenPair, ApiError> {
        self.prune();

        let key = fingerprint(&stale.refresh_token);
        let gate = self.gates.entry(key).or_default().clone();
        let mut slot = gate.lock_owned().await;

        if let Some(settled) = slot.as_ref() {
            if settled.at.elapsed() < GRACE {
                tracing::debug!("Reusing token refresh settled {:?} ago", settled.at.elapsed());
                return settled.outcome.clone();
            }
        }

        let http = self.http.clone();
        let url = self.refresh_url.clone();
        let stale = stale.clone();
        let task = tokio::spawn(async move {
            let outcome = request_refresh(&http, &url, &stale).await;
            match &outcome {
                Ok(_) => tracing::debug!("Access token refreshed"),
                Err(e) => tracing::warn!("Token refresh failed: {e}"),
            }

            *slot = Some(Settled {
                outcome: outcome.clone(),
                at: Instant::now(),
            });
            outcome
        });

        task.await
            .unwrap_or_else(|e| Err(ApiError::Network(format!("Token refresh aborted: {e}"))))
    }

    fn prune(&self) {
        // Unsettled gates are left alone: someone is about to lock them.
        self.gates.retain(|_, gate| match gate.try_lock() {
            Ok(slot) => slot.as_ref().is_none_or(|s| s.at.elapsed() < GRACE),
            Err(_) => true,
        });
    }
}

async fn request_refresh(
    http: &reqwest::Client,
    url: &str,
    stale: &TokenPair,
) -> Result<TokenPair, ApiError> {
    let response = http
        .post(url)
        .json(&json!({ "refreshToken": stale.refresh_token }))
        .send()
        .await?;

    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::Unauthorized(envelope::error_message(status, &body)));
    }

    let refreshed: RefreshResponse = envelope::parse_body(&body)?;
    Ok(TokenPair {
        access_token: refreshed.access_token,
        refresh_token: refreshed
            .refresh_token
            .unwrap_or_else(|| stale.refresh_token.clone()),
    })
}
