use reqwest::StatusCode;

/// Message shown when the backend cannot be reached at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

#[derive(Debug, Clone)]
pub enum ApiError {
    /// The session could not be (re)authenticated. Tokens have been cleared.
    Unauthorized(String),
    /// Backend answered with a non-success status.
    Status { status: StatusCode, message: String },
    /// Connect failure or timeout.
    Network(String),
    /// Superseded by a newer request with the same endpoint key.
    Cancelled,
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text fit for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Network(_) => CONNECTIVITY_MESSAGE.to_string(),
            ApiError::Cancelled => "Request superseded".to_string(),
            ApiError::Decode(_) => "Unexpected response from the server".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ApiError::Status { status, message } => write!(f, "Backend {status}: {message}"),
            ApiError::Network(msg) => write!(f, "Network error: {msg}"),
            ApiError::Cancelled => write!(f, "Request cancelled"),
            ApiError::Decode(msg) => write!(f, "Decode error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
