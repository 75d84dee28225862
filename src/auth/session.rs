use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{self, Claims};
use crate::client::{Session, TokenPair};
use crate::config::Config;
use crate::crypto;
use crate::models::CurrentUser;

pub const SESSION_COOKIE: &str = "hb_session";
pub const USER_COOKIE: &str = "hb_user";

/// Sealed contents of the session cookie.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    sid: String,
    #[serde(flatten)]
    tokens: TokenPair,
}

/// Restore the backend session from the sealed cookie; anonymous if absent or unreadable.
pub fn from_jar(jar: &CookieJar, config: &Config) -> Session {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Session::anonymous();
    };

    let stored = crypto::open(cookie.value(), &config.encryption_key).and_then(|json| {
        serde_json::from_str::<StoredSession>(&json).map_err(|e| format!("Invalid session: {e}"))
    });

    match stored {
        Ok(stored) => Session::new(stored.sid, stored.tokens),
        Err(e) => {
            tracing::debug!("Discarding unreadable session cookie: {e}");
            Session::anonymous()
        }
    }
}

/// The cached `checkUser` result, if it is still valid for this session.
pub fn cached_user(jar: &CookieJar, config: &Config, session: &Session) -> Option<CurrentUser> {
    let cookie = jar.get(USER_COOKIE)?;
    let claims = jwt::decode_token(cookie.value(), &config.session_secret).ok()?;
    (session.id() == Some(claims.sid.as_str())).then(|| claims.into_user())
}

pub fn session_cookie(
    session_id: &str,
    tokens: &TokenPair,
    config: &Config,
) -> Result<Cookie<'static>, String> {
    let stored = StoredSession {
        sid: session_id.to_string(),
        tokens: tokens.clone(),
    };
    let json = serde_json::to_string(&stored).map_err(|e| format!("Session encode failed: {e}"))?;
    let sealed = crypto::seal(&json, &config.encryption_key)?;

    Ok(Cookie::build((SESSION_COOKIE, sealed))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(7))
        .build())
}

pub fn user_cookie(
    user: &CurrentUser,
    session_id: &str,
    config: &Config,
) -> Result<Cookie<'static>, String> {
    let claims = Claims::new(user, session_id);
    let token = jwt::encode_token(&claims, &config.session_secret)?;

    Ok(Cookie::build((USER_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(jwt::USER_TTL_MINUTES))
        .build())
}

/// Both auth cookies for a freshly established session.
pub fn auth_cookies(
    jar: CookieJar,
    session: &Session,
    user: &CurrentUser,
    config: &Config,
) -> Result<CookieJar, String> {
    let (Some(id), Some(tokens)) = (session.id(), session.tokens()) else {
        return Err("Cannot issue cookies for an anonymous session".to_string());
    };
    Ok(jar
        .add(session_cookie(id, &tokens, config)?)
        .add(user_cookie(user, id, config)?))
}

pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    let session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let user = Cookie::build((USER_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    jar.add(session).add(user)
}
