use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::IDENTITY;
use crate::client::{ApiClient, ApiError, RequestOptions, Session, TokenPair};
use crate::models::User;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// Exchange credentials for a backend token pair.
pub async fn login(api: &ApiClient, username: &str, password: &str) -> Result<TokenPair, ApiError> {
    let response: LoginResponse = api
        .send(
            &Session::anonymous(),
            Method::POST,
            &format!("{IDENTITY}/auth/login"),
            Some(&LoginRequest { username, password }),
            &RequestOptions::anonymous(),
        )
        .await?;

    Ok(TokenPair {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
    })
}

/// Revoke the refresh token. Failures are logged, never surfaced: the local
/// session is dropped either way.
pub async fn logout(api: &ApiClient, session: &Session) {
    let Some(tokens) = session.tokens() else {
        return;
    };

    let result: Result<serde::de::IgnoredAny, ApiError> = api
        .send(
            session,
            Method::POST,
            &format!("{IDENTITY}/auth/logout"),
            Some(&json!({ "refreshToken": tokens.refresh_token })),
            &RequestOptions::default(),
        )
        .await;

    if let Err(e) = result {
        tracing::debug!("Backend logout failed: {e}");
    }
}

/// `checkUser`: the profile behind the session's access token.
pub async fn my_info(api: &ApiClient, session: &Session) -> Result<User, ApiError> {
    api.get(session, &format!("{IDENTITY}/users/my-info")).await
}

pub async fn list_users(api: &ApiClient, session: &Session) -> Result<Vec<User>, ApiError> {
    api.list(session, &format!("{IDENTITY}/users"), &[]).await
}

pub async fn update_roles(
    api: &ApiClient,
    session: &Session,
    id: Uuid,
    roles: &[String],
) -> Result<User, ApiError> {
    api.put(
        session,
        &format!("{IDENTITY}/users/{id}/roles"),
        &json!({ "roles": roles }),
    )
    .await
}
