use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub ws_url: String,
    pub session_secret: String,
    pub encryption_key: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub secure_cookies: bool,
    pub request_timeout: Duration,
    pub max_body_size: usize,
    pub log_level: String,
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub transport: WsTransport,
    pub reconnect_delay: Duration,
    pub heartbeat_outgoing: Duration,
    pub heartbeat_incoming: Duration,
    /// Destination template; `{userId}` is replaced with the subscriber's id.
    pub notification_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WsTransport {
    SockJs,
    WebSocket,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            transport: WsTransport::SockJs,
            reconnect_delay: Duration::from_millis(5000),
            heartbeat_outgoing: Duration::from_millis(4000),
            heartbeat_incoming: Duration::from_millis(4000),
            notification_topic: "/topic/notifications/{userId}".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let api_url = env_required_any(&["HACKBOARD_API_URL", "NEXT_PUBLIC_API_URL"])?
            .trim_end_matches('/')
            .to_string();
        let ws_url = env_required_any(&["HACKBOARD_WS_URL", "NEXT_PUBLIC_WS_URL"])?
            .trim_end_matches('/')
            .to_string();
        let session_secret = env_required("HACKBOARD_SESSION_SECRET")?;
        let encryption_key = env_required("HACKBOARD_ENCRYPTION_KEY")?;

        let host: IpAddr = env_or("HACKBOARD_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_HOST: {e}"))?;

        let port: u16 = env_or("HACKBOARD_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_PORT: {e}"))?;

        let base_url = env_or("HACKBOARD_BASE_URL", &format!("http://{host}:{port}"));

        let secure_cookies = match env_or("HACKBOARD_SECURE_COOKIES", "true").as_str() {
            "false" | "0" | "no" => false,
            _ => true,
        };

        let request_timeout: u64 = env_or("HACKBOARD_REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_REQUEST_TIMEOUT_SECS: {e}"))?;

        let max_body_size: usize = env_or("HACKBOARD_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("HACKBOARD_LOG_LEVEL", "info");

        let transport = match env_or("HACKBOARD_WS_TRANSPORT", "sockjs").as_str() {
            "websocket" | "ws" => WsTransport::WebSocket,
            "sockjs" => WsTransport::SockJs,
            other => return Err(format!("Invalid HACKBOARD_WS_TRANSPORT: {other}")),
        };

        let reconnect_delay: u64 = env_or("HACKBOARD_WS_RECONNECT_DELAY_MS", "5000")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_WS_RECONNECT_DELAY_MS: {e}"))?;

        let heartbeat: u64 = env_or("HACKBOARD_WS_HEARTBEAT_MS", "4000")
            .parse()
            .map_err(|e| format!("Invalid HACKBOARD_WS_HEARTBEAT_MS: {e}"))?;

        let notification_topic = env_or(
            "HACKBOARD_WS_NOTIFICATION_TOPIC",
            "/topic/notifications/{userId}",
        );

        Ok(Config {
            api_url,
            ws_url,
            session_secret,
            encryption_key,
            host,
            port,
            base_url,
            secure_cookies,
            request_timeout: Duration::from_secs(request_timeout),
            max_body_size,
            log_level,
            realtime: RealtimeConfig {
                transport,
                reconnect_delay: Duration::from_millis(reconnect_delay),
                heartbeat_outgoing: Duration::from_millis(heartbeat),
                heartbeat_incoming: Duration::from_millis(heartbeat),
                notification_topic,
            },
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_required_any(keys: &[&str]) -> Result<String, String> {
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .ok_or_else(|| {
            format!(
                "Missing required environment variable: {}",
                keys.join(" or ")
            )
        })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
