//! SockJS websocket transport framing.

use rand::Rng;
use rand::distr::Alphanumeric;

#[derive(Debug, Clone, PartialEq)]
pub enum SockJsFrame {
    Open,
    Heartbeat,
    Messages(Vec<String>),
    Close(u16, String),
}

pub fn parse(text: &str) -> Result<SockJsFrame, String> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or_else(|| "Empty SockJS frame".to_string())?;
    let rest = chars.as_str();

    match kind {
        'o' => Ok(SockJsFrame::Open),
        'h' => Ok(SockJsFrame::Heartbeat),
        'a' => serde_json::from_str::<Vec<String>>(rest)
            .map(SockJsFrame::Messages)
            .map_err(|e| format!("Invalid SockJS array frame: {e}")),
        'm' => serde_json::from_str::<String>(rest)
            .map(|m| SockJsFrame::Messages(vec![m]))
            .map_err(|e| format!("Invalid SockJS message frame: {e}")),
        'c' => {
            let (code, reason): (u16, String) = serde_json::from_str(rest)
                .map_err(|e| format!("Invalid SockJS close frame: {e}"))?;
            Ok(SockJsFrame::Close(code, reason))
        }
        other => Err(format!("Unknown SockJS frame type '{other}'")),
    }
}

/// Client-to-server payload: a JSON array of strings.
pub fn encode(messages: &[String]) -> String {
    serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string())
}

/// Map an http(s) endpoint to its ws(s) equivalent; ws(s) passes through.
pub fn ws_scheme(url: &str) -> Result<String, String> {
    if let Some(rest) = url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(url.to_string())
    } else {
        Err(format!("Unsupported WebSocket URL scheme: {url}"))
    }
}

/// `{base}/{server}/{session}/websocket` with a fresh server and session id.
pub fn websocket_url(base: &str) -> Result<String, String> {
    let base = ws_scheme(base.trim_end_matches('/'))?;
    let mut rng = rand::rng();
    let server: u16 = rng.random_range(0..1000);
    let session: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    Ok(format!("{base}/{server:03}/{session}/websocket"))
}
