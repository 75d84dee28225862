//! One-shot toasts carried across a redirect in the `hb_toast` cookie.

use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const TOAST_COOKIE: &str = "hb_toast";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn css_class(&self) -> &'static str {
        self.kind.as_str()
    }
}

pub fn flash(jar: CookieJar, kind: ToastKind, message: &str) -> CookieJar {
    let toast = Toast {
        kind,
        message: message.to_string(),
    };
    let value = serde_json::to_vec(&toast).map(hex::encode).unwrap_or_default();

    jar.add(
        Cookie::build((TOAST_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(1))
            .build(),
    )
}

/// Read and clear the pending toast.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Toast>) {
    let Some(cookie) = jar.get(TOAST_COOKIE) else {
        return (jar, None);
    };

    let toast = hex::decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Toast>(&bytes).ok());
    let jar = jar.remove(Cookie::build(TOAST_COOKIE).path("/").build());
    (jar, toast)
}

/// Redirect after a form post, flashing success or the error message.
/// Lost sessions still surface as 401 so the login redirect kicks in.
pub fn after_submit<T>(
    jar: CookieJar,
    outcome: Result<T, AppError>,
    to: &str,
    success: &str,
) -> Result<(CookieJar, Redirect), AppError> {
    match outcome {
        Ok(_) => Ok((flash(jar, ToastKind::Success, success), Redirect::to(to))),
        Err(AppError::Unauthorized(msg)) => Err(AppError::Unauthorized(msg)),
        Err(e) => {
            tracing::debug!("Form submission failed: {e}");
            Ok((
                flash(jar, ToastKind::Error, &e.public_message()),
                Redirect::to(to),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashed_toast_is_read_once() {
        let jar = flash(CookieJar::new(), ToastKind::Warning, "Heads up: 50% done");
        let value = jar.get(TOAST_COOKIE).unwrap().value().to_string();

        let incoming = CookieJar::new().add(Cookie::new(TOAST_COOKIE, value));
        let (jar, toast) = take(incoming);
        let toast = toast.unwrap();
        assert_eq!(toast.kind, ToastKind::Warning);
        assert_eq!(toast.message, "Heads up: 50% done");
        assert!(jar.get(TOAST_COOKIE).is_none());

        let (_, none) = take(CookieJar::new());
        assert!(none.is_none());
    }
}
