use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::realtime::NotificationHub;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub hub: NotificationHub,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, String> {
        let api = ApiClient::new(&config.api_url, config.request_timeout)?;
        let hub = NotificationHub::new(&config.ws_url, config.realtime.clone());
        Ok(Self {
            config,
            api,
            hub,
            login_limiter: LoginRateLimiter::new(),
        })
    }
}
