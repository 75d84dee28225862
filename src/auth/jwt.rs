use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::Role;
use crate::models::CurrentUser;

/// How long a resolved `checkUser` result is trusted before asking the identity service again.
pub const USER_TTL_MINUTES: i64 = 5;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub display: String,
    pub roles: Vec<Role>,
    /// Id of the browser session these claims were resolved for.
    pub sid: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &CurrentUser, session_id: &str) -> Self {
        Self {
            sub: user.id,
            name: user.username.clone(),
            display: user.display_name.clone(),
            roles: user.roles.clone(),
            sid: session_id.to_string(),
            exp: (Utc::now() + Duration::minutes(USER_TTL_MINUTES)).timestamp(),
        }
    }

    pub fn into_user(self) -> CurrentUser {
        CurrentUser {
            id: self.sub,
            username: self.name,
            display_name: self.display,
            roles: self.roles,
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
