use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use super::error::ApiError;

type Inflight = Arc<DashMap<String, (u64, CancellationToken)>>;

/// At most one in-flight request per endpoint key.
///
/// Starting a request under a key cancels whatever was running under it.
pub struct RequestRegistry {
    inflight: Inflight,
    next_id: AtomicU64,
}

/// Registration of a running request. Unregisters itself on drop.
pub struct InFlight {
    key: String,
    id: u64,
    token: CancellationToken,
    inflight: Inflight,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new request under `key`, cancelling the previous one first.
    pub fn begin(&self, key: &str) -> InFlight {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some((previous_id, previous)) = self
            .inflight
            .insert(key.to_string(), (id, token.clone()))
        {
            tracing::debug!("Request {previous_id} superseded by {id} for key {key}");
            previous.cancel();
        }

        InFlight {
            key: key.to_string(),
            id,
            token,
            inflight: self.inflight.clone(),
        }
    }

    /// Cancel the request running under `key`, if any.
    pub fn cancel(&self, key: &str) -> bool {
        match self.inflight.remove(key) {
            Some((_, (_, token))) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlight {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` until it completes or a newer request supersedes this one.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ApiError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ApiError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inflight.remove_if(&self.key, |_, (id, _)| *id == self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn new_request_cancels_previous_for_same_key() {
        let registry = RequestRegistry::new();
        let first = registry.begin("s1:search");
        assert!(!first.is_cancelled());

        let second = registry.begin("s1:search");
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());

        let result = first.run(tokio::time::sleep(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));

        let result = second.run(async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn different_keys_do_not_interfere() {
        let registry = RequestRegistry::new();
        let a = registry.begin("s1:teams");
        let b = registry.begin("s1:hackathons");
        let c = registry.begin("s2:teams");
        assert!(!a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!c.is_cancelled());
        assert_eq!(registry.in_flight(), 3);
    }

    #[test]
    fn superseded_request_drop_keeps_newer_registration() {
        let registry = RequestRegistry::new();
        let first = registry.begin("k");
        let second = registry.begin("k");
        drop(first);
        assert_eq!(registry.in_flight(), 1);
        drop(second);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn explicit_cancel() {
        let registry = RequestRegistry::new();
        let running = registry.begin("k");
        assert!(registry.cancel("k"));
        assert!(running.is_cancelled());
        assert!(!registry.cancel("k"));
    }
}
