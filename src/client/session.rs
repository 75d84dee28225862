use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend credentials for one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// What happened to a session's tokens while a request was being served.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    Unchanged,
    Updated(TokenPair),
    Cleared,
}

/// Per-request holder of the backend token pair.
///
/// The API client swaps tokens in place after a refresh and clears them when
/// re-authentication fails; the auth middleware turns that into cookies.
#[derive(Debug)]
pub struct Session {
    id: Option<String>,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    tokens: Option<TokenPair>,
    change: SessionChange,
}

impl Session {
    /// A session restored from its cookie. `id` stays the same across token rotations.
    pub fn new(id: impl Into<String>, tokens: TokenPair) -> Self {
        Self {
            id: Some(id.into()),
            state: Mutex::new(SessionState {
                tokens: Some(tokens),
                change: SessionChange::Unchanged,
            }),
        }
    }

    /// A brand new session right after login.
    pub fn establish(tokens: TokenPair) -> Self {
        Self::new(Uuid::now_v7().to_string(), tokens)
    }

    pub fn anonymous() -> Self {
        Self {
            id: None,
            state: Mutex::new(SessionState {
                tokens: None,
                change: SessionChange::Unchanged,
            }),
        }
    }

    /// Stable id of the browser session; `None` for visitors without one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.lock().tokens.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().tokens.is_some()
    }

    pub fn replace(&self, tokens: TokenPair) {
        let mut state = self.lock();
        state.tokens = Some(tokens.clone());
        state.change = SessionChange::Updated(tokens);
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.tokens = None;
        state.change = SessionChange::Cleared;
    }

    pub fn change(&self) -> SessionChange {
        self.lock().change.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A poisoned lock only means another request panicked mid-update;
        // the token pair itself is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
