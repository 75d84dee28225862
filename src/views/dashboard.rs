use axum::response::Redirect;

use crate::auth::extractor::AuthUser;
use crate::middleware::role_guard::FORBIDDEN_PATH;

/// Send the user to the home page of their highest role.
pub async fn index(auth: AuthUser) -> Redirect {
    match auth.user.primary_role() {
        Some(role) => Redirect::to(role.home()),
        None => {
            tracing::debug!(username = %auth.user.username, "User holds no dashboard role");
            Redirect::to(FORBIDDEN_PATH)
        }
    }
}
